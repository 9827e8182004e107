use std::future::Future;

use crate::error::AppError;
use crate::models::{
    Collection, DeleteResult, Document, Filter, InsertResult, StoredDocument, UpdateOne,
    UpdateResult,
};

/// Persists schemaless documents grouped into named collections.
pub trait DocumentStore: Send + Sync + Clone {
    /// Insert a new document under a freshly generated id.
    fn insert_one(
        &self,
        collection: Collection,
        doc: Document,
    ) -> impl Future<Output = Result<InsertResult, AppError>> + Send;

    /// All matching documents, oldest first.
    fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<StoredDocument>, AppError>> + Send;

    /// The oldest matching document, if any.
    fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> impl Future<Output = Result<Option<StoredDocument>, AppError>> + Send;

    /// Shallow-merge `patch` into the first matching document.
    ///
    /// With `upsert`, a miss inserts the filter's fields merged with `patch`,
    /// reusing the filter's id when it has one.
    fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Document,
        upsert: bool,
    ) -> impl Future<Output = Result<UpdateResult, AppError>> + Send;

    /// Insert `doc` and apply `update` atomically: if either write fails,
    /// neither is kept.
    fn insert_with_update(
        &self,
        collection: Collection,
        doc: Document,
        update: UpdateOne,
    ) -> impl Future<Output = Result<(InsertResult, UpdateResult), AppError>> + Send;

    /// Remove the first matching document.
    fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> impl Future<Output = Result<DeleteResult, AppError>> + Send;

    /// Check that the store is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A payment intent created by the provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Creates payment intents with an external provider.
pub trait PaymentGateway: Send + Sync + Clone {
    /// `amount` is in the currency's minor unit (cents for USD).
    fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> impl Future<Output = Result<PaymentIntent, AppError>> + Send;
}
