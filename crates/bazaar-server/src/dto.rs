use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::checkout::PaymentRecord;
use bazaar_core::models::{DeleteResult, InsertResult, UpdateResult};

// ---------------------------------------------------------------------------
// Write results
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

impl From<InsertResult> for InsertResponse {
    fn from(r: InsertResult) -> Self {
        Self {
            acknowledged: r.acknowledged,
            inserted_id: r.inserted_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
}

impl From<UpdateResult> for UpdateResponse {
    fn from(r: UpdateResult) -> Self {
        Self {
            acknowledged: r.acknowledged,
            matched_count: r.matched_count,
            modified_count: r.modified_count,
            upserted_id: r.upserted_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteResponse {
    fn from(r: DeleteResult) -> Self {
        Self {
            acknowledged: r.acknowledged,
            deleted_count: r.deleted_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserTokenResponse {
    pub result: UpdateResponse,
    /// Bearer token for subsequent requests
    pub token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SellerVerificationResponse {
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RoleQuery {
    /// Only users with this role; all users when omitted
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CategoryQuery {
    /// Product category; all products when omitted
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SellerQuery {
    /// Seller email matched against `sellerEmail`
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PaymentIntentRequest {
    /// Decimal price, as a number or numeric string
    #[serde(rename = "itemPrice")]
    pub item_price: serde_json::Value,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PaymentIntentResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PaymentResponse {
    pub result: InsertResponse,
    pub booking: UpdateResponse,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(r: PaymentRecord) -> Self {
        Self {
            result: r.result.into(),
            booking: r.booking.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub payments: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
