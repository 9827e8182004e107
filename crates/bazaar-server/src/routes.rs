use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use chrono::Utc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use bazaar_core::AppError;
use bazaar_core::access::{check_role_patch, stored_role};
use bazaar_core::checkout;
use bazaar_core::models::{Collection, Document, Filter};
use bazaar_core::traits::DocumentStore;

use crate::auth::{TOKEN_COOKIE, require_admin, require_auth};
use crate::dto::{
    CategoryQuery, DeleteResponse, HealthResponse, InsertResponse, PaymentIntentRequest,
    PaymentIntentResponse, PaymentResponse, RoleQuery, SellerQuery, SellerVerificationResponse,
    UpdateResponse, UserTokenResponse,
};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    // Layers run outermost-last, so `require_auth` wraps `require_admin`.
    let admin = Router::new()
        .route("/users/{id}", delete(delete_user))
        .route("/reported", get(list_reported))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let authenticated = Router::new()
        .route("/users", get(list_users))
        .route("/products", post(create_product))
        .route("/products/advertised", post(create_advertised))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/bookings", post(create_booking))
        .route("/bookings/{email}", get(list_bookings))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/user/{email}", put(upsert_user).get(get_user))
        .route("/user/seller/{email}", get(get_seller_verification))
        .route("/products", get(list_products))
        .route("/products/camera", get(list_products_by_category))
        .route("/products/seller", get(list_products_by_seller))
        .route("/products/{id}", get(get_product))
        .route("/advertised", get(list_advertised))
        .route("/advertised/v2", get(list_advertised_products))
        .route("/bookings/product/{id}", get(get_booking))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/payments", post(create_payment))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(authenticated).merge(admin).with_state(state)
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError(AppError::InvalidInput(format!("invalid id: {raw}"))))
}

fn not_found(what: &str, key: &str) -> ApiError {
    ApiError(AppError::NotFound(format!("{what} not found: {key}")))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    path = "/user/{email}",
    params(("email" = String, Path, description = "User email")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "User saved and token issued", body = UserTokenResponse),
        (status = 400, description = "Malformed body", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin role cannot be claimed or given up", body = crate::dto::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = body.without_id();
    let repo = state.db.documents();
    check_role_patch(stored_role(&repo, &email).await?, &mut user)?;
    user.insert("email", email.as_str());

    let result = repo
        .update_one(
            Collection::Users,
            &Filter::all().eq("email", email.as_str()),
            user,
            true,
        )
        .await?;

    let token = state.tokens.issue(&email)?;
    tracing::info!(%email, "User saved, token issued");

    let expires = Utc::now() + state.tokens.ttl();
    let cookie = format!(
        "{TOKEN_COOKIE}={token}; Path=/; Expires={}",
        expires.format("%a, %d %b %Y %H:%M:%S GMT")
    );

    let response = UserTokenResponse {
        result: result.into(),
        token,
    };

    Ok(([(SET_COOKIE, cookie)], axum::Json(response)))
}

#[utoipa::path(
    get,
    path = "/user/{email}",
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "User document", body = serde_json::Value),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .documents()
        .find_one(Collection::Users, &Filter::all().eq("email", email.as_str()))
        .await?
        .ok_or_else(|| not_found("User", &email))?;

    Ok(axum::Json(user))
}

#[utoipa::path(
    get,
    path = "/user/seller/{email}",
    params(("email" = String, Path, description = "Seller email")),
    responses(
        (status = 200, description = "Verification flag", body = SellerVerificationResponse),
    ),
    tag = "users"
)]
pub async fn get_seller_verification(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .documents()
        .find_one(Collection::Users, &Filter::all().eq("email", email.as_str()))
        .await?;

    let is_verified = user
        .and_then(|u| u.body.get("isVerified").and_then(serde_json::Value::as_bool))
        .unwrap_or(false);

    Ok(axum::Json(SellerVerificationResponse { is_verified }))
}

#[utoipa::path(
    get,
    path = "/users",
    params(RoleQuery),
    responses(
        (status = 200, description = "Users", body = [serde_json::Value]),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = match query.role {
        Some(role) => Filter::all().eq("role", role),
        None => Filter::all(),
    };
    let users = state.db.documents().find(Collection::Users, &filter).await?;

    Ok(axum::Json(users))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Delete result", body = DeleteResponse),
        (status = 400, description = "Invalid id", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .db
        .documents()
        .delete_one(Collection::Users, &Filter::by_id(id))
        .await?;

    tracing::info!(%id, deleted = result.deleted_count, "User deleted");
    Ok(axum::Json(DeleteResponse::from(result)))
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/products",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Insert result", body = InsertResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .db
        .documents()
        .insert_one(Collection::Products, body)
        .await?;

    tracing::info!(id = %result.inserted_id, "Product created");
    Ok(axum::Json(InsertResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/products",
    responses((status = 200, description = "All products", body = [serde_json::Value])),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .db
        .documents()
        .find(Collection::Products, &Filter::all())
        .await?;

    Ok(axum::Json(products))
}

#[utoipa::path(
    get,
    path = "/products/camera",
    params(CategoryQuery),
    responses((status = 200, description = "Products in category", body = [serde_json::Value])),
    tag = "products"
)]
pub async fn list_products_by_category(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = match query.category {
        Some(category) => Filter::all().eq("category", category),
        None => Filter::all(),
    };
    let products = state.db.documents().find(Collection::Products, &filter).await?;

    Ok(axum::Json(products))
}

#[utoipa::path(
    get,
    path = "/products/seller",
    params(SellerQuery),
    responses(
        (status = 200, description = "Products listed by the seller", body = [serde_json::Value]),
        (status = 400, description = "Missing email", body = crate::dto::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_products_by_seller(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SellerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let email = query
        .email
        .ok_or_else(|| AppError::InvalidInput("email query parameter is required".into()))?;

    let products = state
        .db
        .documents()
        .find(Collection::Products, &Filter::all().eq("sellerEmail", email))
        .await?;

    Ok(axum::Json(products))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product document", body = serde_json::Value),
        (status = 400, description = "Invalid id", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product_id = parse_id(&id)?;
    let product = state
        .db
        .documents()
        .find_one(Collection::Products, &Filter::by_id(product_id))
        .await?
        .ok_or_else(|| not_found("Product", &id))?;

    Ok(axum::Json(product))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Invalid id", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .db
        .documents()
        .update_one(Collection::Products, &Filter::by_id(id), body, true)
        .await?;

    tracing::info!(%id, modified = result.modified_count, "Product updated");
    Ok(axum::Json(UpdateResponse::from(result)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Delete result", body = DeleteResponse),
        (status = 400, description = "Invalid id", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .db
        .documents()
        .delete_one(Collection::Products, &Filter::by_id(id))
        .await?;

    tracing::info!(%id, deleted = result.deleted_count, "Product deleted");
    Ok(axum::Json(DeleteResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/reported",
    responses(
        (status = 200, description = "Reported products", body = [serde_json::Value]),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn list_reported(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .db
        .documents()
        .find(Collection::Products, &Filter::all().eq("status", "reported"))
        .await?;

    Ok(axum::Json(products))
}

// ---------------------------------------------------------------------------
// Advertised listings
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/products/advertised",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Insert result", body = InsertResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "advertised"
)]
pub async fn create_advertised(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .db
        .documents()
        .insert_one(Collection::Advertised, body)
        .await?;

    tracing::info!(id = %result.inserted_id, "Listing advertised");
    Ok(axum::Json(InsertResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/advertised",
    responses((status = 200, description = "Advertised listings", body = [serde_json::Value])),
    tag = "advertised"
)]
pub async fn list_advertised(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let listings = state
        .db
        .documents()
        .find(Collection::Advertised, &Filter::all())
        .await?;

    Ok(axum::Json(listings))
}

#[utoipa::path(
    get,
    path = "/advertised/v2",
    responses((status = 200, description = "Products flagged as advertised", body = [serde_json::Value])),
    tag = "advertised"
)]
pub async fn list_advertised_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .db
        .documents()
        .find(Collection::Products, &Filter::all().eq("isAdvertised", true))
        .await?;

    Ok(axum::Json(products))
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Insert result", body = InsertResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .db
        .documents()
        .insert_one(Collection::Bookings, body)
        .await?;

    tracing::info!(id = %result.inserted_id, "Booking created");
    Ok(axum::Json(InsertResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/bookings/{email}",
    params(("email" = String, Path, description = "Buyer email")),
    responses(
        (status = 200, description = "Bookings made by the buyer", body = [serde_json::Value]),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state
        .db
        .documents()
        .find(Collection::Bookings, &Filter::all().eq("buyerEmail", email))
        .await?;

    Ok(axum::Json(bookings))
}

#[utoipa::path(
    get,
    path = "/bookings/product/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking document", body = serde_json::Value),
        (status = 400, description = "Invalid id", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = parse_id(&id)?;
    let booking = state
        .db
        .documents()
        .find_one(Collection::Bookings, &Filter::by_id(booking_id))
        .await?
        .ok_or_else(|| not_found("Booking", &id))?;

    Ok(axum::Json(booking))
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/create-payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret for the new intent", body = PaymentIntentResponse),
        (status = 400, description = "Invalid price", body = crate::dto::ErrorResponse),
        (status = 502, description = "Payment provider error", body = crate::dto::ErrorResponse),
        (status = 503, description = "Payments not configured", body = crate::dto::ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<PaymentIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gateway = state.payments.as_ref().ok_or(AppError::PaymentsUnavailable)?;
    let intent = checkout::create_payment_intent(gateway, &body.item_price, &state.currency).await?;

    Ok(axum::Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

#[utoipa::path(
    post,
    path = "/payments",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Payment stored and booking marked paid", body = PaymentResponse),
        (status = 400, description = "Missing or invalid bookingId", body = crate::dto::ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let record = checkout::record_payment(&state.db.documents(), body.without_id()).await?;

    Ok(axum::Json(PaymentResponse::from(record)))
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

pub async fn root() -> &'static str {
    "Bazaar server is running"
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
        payments: if state.payments.is_some() {
            "configured"
        } else {
            "disabled"
        },
    };

    (status, axum::Json(response))
}
