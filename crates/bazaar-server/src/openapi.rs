use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bazaar API",
        version = "0.1.0",
        description = "Second-hand marketplace: users, products, advertised listings, bookings and payments."
    ),
    paths(
        crate::routes::upsert_user,
        crate::routes::get_user,
        crate::routes::get_seller_verification,
        crate::routes::list_users,
        crate::routes::delete_user,
        crate::routes::create_product,
        crate::routes::list_products,
        crate::routes::list_products_by_category,
        crate::routes::list_products_by_seller,
        crate::routes::get_product,
        crate::routes::update_product,
        crate::routes::delete_product,
        crate::routes::list_reported,
        crate::routes::create_advertised,
        crate::routes::list_advertised,
        crate::routes::list_advertised_products,
        crate::routes::create_booking,
        crate::routes::list_bookings,
        crate::routes::get_booking,
        crate::routes::create_payment_intent,
        crate::routes::create_payment,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::InsertResponse,
        crate::dto::UpdateResponse,
        crate::dto::DeleteResponse,
        crate::dto::UserTokenResponse,
        crate::dto::SellerVerificationResponse,
        crate::dto::PaymentIntentRequest,
        crate::dto::PaymentIntentResponse,
        crate::dto::PaymentResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "users", description = "User records and token issue"),
        (name = "products", description = "Product listings"),
        (name = "advertised", description = "Advertised listings"),
        (name = "bookings", description = "Buyer bookings"),
        (name = "payments", description = "Payment intents and payment records"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the JWT bearer security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token returned by PUT /user/{email}, signed with ACCESS_TOKEN_SECRET.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
