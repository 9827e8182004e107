pub mod access;
pub mod checkout;
pub mod error;
pub mod models;
pub mod money;
pub mod token;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::AppError;
pub use models::{
    Collection, DeleteResult, Document, Filter, InsertResult, Role, StoredDocument, UpdateOne,
    UpdateResult,
};
pub use token::{Claims, TokenIssuer};
pub use traits::{DocumentStore, PaymentGateway, PaymentIntent};
