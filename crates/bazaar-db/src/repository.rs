use bazaar_core::error::AppError;
use bazaar_core::models::{
    Collection, DeleteResult, Document, Filter, InsertResult, StoredDocument, UpdateOne,
    UpdateResult,
};
use bazaar_core::traits::DocumentStore;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Pool, Postgres};
use uuid::Uuid;

/// Row predicate shared by every filtered query.
///
/// `$1` collection, `$2` containment object, `$3` optional id.
const MATCHES: &str = "collection = $1 AND body @> $2 AND ($3::uuid IS NULL OR id = $3)";

/// Oldest-first order so "first match" is stable.
const ORDER: &str = "ORDER BY created_at ASC, id ASC";

/// JSONB-backed document store in PostgreSQL.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: Pool<Postgres>,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM documents WHERE collection = $1"#)
                .bind(collection.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(count)
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self, collection: Collection) -> StoredDocument {
        StoredDocument {
            id: self.id,
            collection,
            body: Document::from_value(self.body).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Primary key of `documents`; ids are unique across every collection.
const PRIMARY_KEY: &str = "documents_pkey";

fn db_error(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() && db.constraint() == Some(PRIMARY_KEY) => {
            AppError::InvalidInput("document id is already taken by another document".into())
        }
        Some(db) if db.is_unique_violation() => {
            AppError::InvalidInput(format!("duplicate document: {}", db.message()))
        }
        _ => AppError::DatabaseError(e.to_string()),
    }
}

/// Unique violation on a secondary index, e.g. two first-time upserts of the
/// same user email racing each other.
fn is_secondary_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation() && db.constraint() != Some(PRIMARY_KEY))
}

// -- Statements shared by pooled and transactional writes --

async fn insert_document(
    conn: &mut PgConnection,
    collection: Collection,
    doc: Document,
) -> Result<Uuid, sqlx::Error> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO documents (collection, body)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(collection.as_str())
    .bind(doc.without_id().into_value())
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

async fn update_document(
    conn: &mut PgConnection,
    collection: Collection,
    filter: &Filter,
    patch: &Document,
    upsert: bool,
) -> Result<UpdateResult, sqlx::Error> {
    // RETURNING sees the new `d.body` next to the locked old `target.body`.
    let sql = format!(
        r#"
        WITH target AS (
            SELECT id, body FROM documents
            WHERE {MATCHES}
            {ORDER}
            LIMIT 1
            FOR UPDATE
        )
        UPDATE documents AS d
        SET body = target.body || $4,
            updated_at = CASE WHEN target.body || $4 = target.body
                              THEN d.updated_at ELSE NOW() END
        FROM target
        WHERE d.id = target.id
        RETURNING d.body <> target.body
        "#
    );
    let updated: Option<(bool,)> = sqlx::query_as(&sql)
        .bind(collection.as_str())
        .bind(filter.to_containment())
        .bind(filter.id())
        .bind(patch.clone().into_value())
        .fetch_optional(&mut *conn)
        .await?;

    if let Some((modified,)) = updated {
        return Ok(UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_id: None,
        });
    }

    if !upsert {
        return Ok(UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: None,
        });
    }

    let mut body = filter.seed_document();
    body.merge(patch);

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO documents (id, collection, body)
        VALUES (COALESCE($1, gen_random_uuid()), $2, $3)
        RETURNING id
        "#,
    )
    .bind(filter.id())
    .bind(collection.as_str())
    .bind(body.into_value())
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(%collection, %id, "Document upserted");
    Ok(UpdateResult {
        acknowledged: true,
        matched_count: 0,
        modified_count: 0,
        upserted_id: Some(id),
    })
}

// -- Trait implementation --

impl DocumentStore for DocumentRepository {
    async fn insert_one(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<InsertResult, AppError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let id = insert_document(&mut conn, collection, doc)
            .await
            .map_err(db_error)?;

        tracing::debug!(%collection, %id, "Document inserted");
        Ok(InsertResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, AppError> {
        let sql = format!(
            "SELECT id, body, created_at, updated_at FROM documents WHERE {MATCHES} {ORDER}"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(collection.as_str())
            .bind(filter.to_containment())
            .bind(filter.id())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_document(collection))
            .collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<StoredDocument>, AppError> {
        let sql = format!(
            "SELECT id, body, created_at, updated_at FROM documents WHERE {MATCHES} {ORDER} LIMIT 1"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(collection.as_str())
            .bind(filter.to_containment())
            .bind(filter.id())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(|row| row.into_document(collection)))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Document,
        upsert: bool,
    ) -> Result<UpdateResult, AppError> {
        let patch = patch.without_id();
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        match update_document(&mut conn, collection, filter, &patch, upsert).await {
            // A concurrent upsert inserted the document first; merge into it instead.
            Err(e) if upsert && is_secondary_unique_violation(&e) => {
                tracing::debug!(%collection, "Upsert lost an insert race, retrying as update");
                let retried = update_document(&mut conn, collection, filter, &patch, false)
                    .await
                    .map_err(db_error)?;
                if retried.matched_count == 0 {
                    return Err(db_error(e));
                }
                Ok(retried)
            }
            result => result.map_err(db_error),
        }
    }

    async fn insert_with_update(
        &self,
        collection: Collection,
        doc: Document,
        update: UpdateOne,
    ) -> Result<(InsertResult, UpdateResult), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let id = insert_document(&mut tx, collection, doc)
            .await
            .map_err(db_error)?;
        let updated = update_document(
            &mut tx,
            update.collection,
            &update.filter,
            &update.patch.without_id(),
            update.upsert,
        )
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(
            %collection,
            %id,
            target = %update.collection,
            "Document inserted with update"
        );
        Ok((
            InsertResult {
                acknowledged: true,
                inserted_id: id,
            },
            updated,
        ))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, AppError> {
        let sql = format!(
            r#"
            DELETE FROM documents
            WHERE id = (
                SELECT id FROM documents
                WHERE {MATCHES}
                {ORDER}
                LIMIT 1
            )
            "#
        );
        let result = sqlx::query(&sql)
            .bind(collection.as_str())
            .bind(filter.to_containment())
            .bind(filter.id())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
