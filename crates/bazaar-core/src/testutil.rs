//! Test utilities: in-memory implementations of the core traits.
//!
//! State lives behind `Arc<Mutex<_>>` so clones share it and tests can
//! inspect what was recorded.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Collection, DeleteResult, Document, Filter, InsertResult, StoredDocument, UpdateOne,
    UpdateResult,
};
use crate::traits::{DocumentStore, PaymentGateway, PaymentIntent};

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

/// Document store backed by a vector, kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    docs: Arc<Mutex<Vec<StoredDocument>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert_into(
    docs: &mut Vec<StoredDocument>,
    collection: Collection,
    doc: Document,
) -> InsertResult {
    let now = Utc::now();
    let id = Uuid::new_v4();
    docs.push(StoredDocument {
        id,
        collection,
        body: doc.without_id(),
        created_at: now,
        updated_at: now,
    });

    InsertResult {
        acknowledged: true,
        inserted_id: id,
    }
}

fn update_in(
    docs: &mut Vec<StoredDocument>,
    collection: Collection,
    filter: &Filter,
    patch: Document,
    upsert: bool,
) -> Result<UpdateResult, AppError> {
    let patch = patch.without_id();

    if let Some(doc) = docs
        .iter_mut()
        .find(|d| d.collection == collection && filter.matches(d))
    {
        let before = doc.body.clone();
        doc.body.merge(&patch);
        let modified = doc.body != before;
        if modified {
            doc.updated_at = Utc::now();
        }
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

    // Ids are unique across collections, like the table's primary key.
    if let Some(id) = filter.id()
        && docs.iter().any(|d| d.id == id)
    {
        return Err(AppError::InvalidInput(format!(
            "document id {id} is already taken by another document"
        )));
    }

    let mut body = filter.seed_document();
    body.merge(&patch);
    let id = filter.id().unwrap_or_else(Uuid::new_v4);
    let now = Utc::now();
    docs.push(StoredDocument {
        id,
        collection,
        body,
        created_at: now,
        updated_at: now,
    });

    Ok(UpdateResult {
        acknowledged: true,
        matched_count: 0,
        modified_count: 0,
        upserted_id: Some(id),
    })
}

impl DocumentStore for InMemoryStore {
    async fn insert_one(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<InsertResult, AppError> {
        let mut docs = self.docs.lock().unwrap();
        Ok(insert_into(&mut docs, collection, doc))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, AppError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .filter(|d| d.collection == collection && filter.matches(d))
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<StoredDocument>, AppError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .find(|d| d.collection == collection && filter.matches(d))
            .cloned())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Document,
        upsert: bool,
    ) -> Result<UpdateResult, AppError> {
        let mut docs = self.docs.lock().unwrap();
        update_in(&mut docs, collection, filter, patch, upsert)
    }

    async fn insert_with_update(
        &self,
        collection: Collection,
        doc: Document,
        update: UpdateOne,
    ) -> Result<(InsertResult, UpdateResult), AppError> {
        let mut docs = self.docs.lock().unwrap();

        // Stage both writes and only publish them if both succeed.
        let mut staged = docs.clone();
        let inserted = insert_into(&mut staged, collection, doc);
        let updated = update_in(
            &mut staged,
            update.collection,
            &update.filter,
            update.patch,
            update.upsert,
        )?;
        *docs = staged;

        Ok((inserted, updated))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, AppError> {
        let mut docs = self.docs.lock().unwrap();
        let position = docs
            .iter()
            .position(|d| d.collection == collection && filter.matches(d));

        let deleted_count = match position {
            Some(index) => {
                docs.remove(index);
                1
            }
            None => 0,
        };

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

/// Payment gateway that records calls and returns a canned intent or error.
#[derive(Clone)]
pub struct MockGateway {
    response: Arc<Mutex<Option<Result<PaymentIntent, AppError>>>>,
    calls: Arc<Mutex<Vec<(i64, String)>>>,
}

impl MockGateway {
    pub fn new(id: &str, client_secret: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Ok(PaymentIntent {
                id: id.to_string(),
                client_secret: client_secret.to_string(),
            })))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Err(error)))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(amount, currency)` pairs received so far.
    pub fn calls(&self) -> Vec<(i64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((amount, currency.to_string()));

        let mut response = self.response.lock().unwrap();
        if let Some(Ok(intent)) = response.as_ref() {
            return Ok(intent.clone());
        }
        response
            .take()
            .unwrap_or_else(|| Err(AppError::Generic("mock gateway exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_without_match_and_without_upsert() {
        let store = InMemoryStore::new();
        let result = store
            .update_one(
                Collection::Products,
                &Filter::by_id(Uuid::new_v4()),
                Document::new().with("price", 10),
                false,
            )
            .await
            .unwrap();

        assert_eq!(result.matched_count, 0);
        assert_eq!(result.upserted_id, None);
        assert!(store.find(Collection::Products, &Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_update_reports_zero_modified() {
        let store = InMemoryStore::new();
        let inserted = store
            .insert_one(Collection::Products, Document::new().with("price", 10))
            .await
            .unwrap();

        let result = store
            .update_one(
                Collection::Products,
                &Filter::by_id(inserted.inserted_id),
                Document::new().with("price", json!(10)),
                true,
            )
            .await
            .unwrap();

        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 0);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = InMemoryStore::new();
        store
            .insert_one(Collection::Products, Document::new().with("name", "Lens"))
            .await
            .unwrap();

        assert!(store.find(Collection::Advertised, &Filter::all()).await.unwrap().is_empty());
        let deleted = store
            .delete_one(Collection::Advertised, &Filter::all())
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 0);
    }
}
