use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::{delete, get, json, setup_test_app};

// =============================================================================
// System
// =============================================================================

#[tokio::test]
async fn test_health_reports_database_and_payments() {
    let app = setup_test_app().await;

    let (status, body) = app.send(get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["payments"], "configured");
}

#[tokio::test]
async fn test_root_banner() {
    let app = setup_test_app().await;

    let response = app.router.clone().oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app().await;

    let (status, body) = app.send(get("/api-docs/openapi.json", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/create-payment-intent"].is_object());
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_missing_authorization_is_401() {
    let app = setup_test_app().await;

    let (status, body) = app.send(get("/users", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_invalid_token_is_403() {
    let app = setup_test_app().await;

    let (status, body) = app.send(get("/users", Some("not-a-jwt"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_403() {
    let app = setup_test_app().await;
    let foreign = bazaar_core::TokenIssuer::new("some-other-secret")
        .issue("mallory@example.com")
        .unwrap();

    let (status, _) = app.send(get("/users", Some(&foreign))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_403() {
    let app = setup_test_app().await;
    let request = axum::http::Request::builder()
        .uri("/users")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_upsert_user_issues_token_and_cookie() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json(
            "PUT",
            "/user/alice@example.com",
            None,
            json!({"name": "Alice", "role": "seller"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("bazaar-token="));
    assert!(cookie.contains("Expires="));

    let (_, body) = app
        .send(json(
            "PUT",
            "/user/alice@example.com",
            None,
            json!({"name": "Alice", "role": "seller"}),
        ))
        .await;
    assert_eq!(body["result"]["matchedCount"], 1);
    assert_eq!(body["result"]["modifiedCount"], 0);

    // The issued token opens authenticated routes.
    let token = body["token"].as_str().unwrap().to_string();
    let (status, users) = app.send(get("/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_first_upsert_reports_upserted_id() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(json("PUT", "/user/bob@example.com", None, json!({"role": "buyer"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["matchedCount"], 0);
    assert!(body["result"]["upsertedId"].is_string());
}

#[tokio::test]
async fn test_upsert_user_cannot_claim_admin() {
    let app = setup_test_app().await;

    let (status, body) = app
        .send(json("PUT", "/user/eve@example.com", None, json!({"role": "admin"})))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = app.send(get("/user/eve@example.com", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_can_log_in_again_with_admin_role() {
    let app = setup_test_app().await;
    app.seed_user("root@example.com", "admin").await;

    let (status, body) = app
        .send(json("PUT", "/user/root@example.com", None, json!({"role": "admin"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["matchedCount"], 1);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = app.send(get("/reported", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_role_cannot_be_given_up() {
    let app = setup_test_app().await;
    app.seed_user("root@example.com", "admin").await;

    let (status, body) = app
        .send(json("PUT", "/user/root@example.com", None, json!({"role": "buyer"})))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (_, user) = app.send(get("/user/root@example.com", None)).await;
    assert_eq!(user["role"], "admin");
}

#[tokio::test]
async fn test_get_user_and_seller_verification() {
    let app = setup_test_app().await;
    app.send(json(
        "PUT",
        "/user/sam@example.com",
        None,
        json!({"role": "seller", "isVerified": true}),
    ))
    .await;

    let (status, user) = app.send(get("/user/sam@example.com", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "sam@example.com");
    assert!(user["_id"].is_string());

    let (_, verified) = app.send(get("/user/seller/sam@example.com", None)).await;
    assert_eq!(verified["isVerified"], true);

    let (status, unknown) = app.send(get("/user/seller/nobody@example.com", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown["isVerified"], false);
}

#[tokio::test]
async fn test_list_users_by_role() {
    let app = setup_test_app().await;
    app.seed_user("s1@example.com", "seller").await;
    app.seed_user("s2@example.com", "seller").await;
    app.seed_user("b1@example.com", "buyer").await;
    let token = app.token_for("b1@example.com");

    let (_, sellers) = app.send(get("/users?role=seller", Some(&token))).await;
    assert_eq!(sellers.as_array().unwrap().len(), 2);

    let (_, everyone) = app.send(get("/users", Some(&token))).await;
    assert_eq!(everyone.as_array().unwrap().len(), 3);
}

// =============================================================================
// Admin routes
// =============================================================================

#[tokio::test]
async fn test_delete_user_requires_admin() {
    let app = setup_test_app().await;
    let victim = app.seed_user("victim@example.com", "buyer").await;
    app.seed_user("seller@example.com", "seller").await;
    let token = app.token_for("seller@example.com");

    let (status, body) = app
        .send(delete(&format!("/users/{victim}"), Some(&token)))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_admin_deletes_user() {
    let app = setup_test_app().await;
    let victim = app.seed_user("victim@example.com", "buyer").await;
    app.seed_user("root@example.com", "admin").await;
    let token = app.token_for("root@example.com");

    let (status, body) = app
        .send(delete(&format!("/users/{victim}"), Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);

    let (status, _) = app.send(get("/user/victim@example.com", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_route_without_token_is_401() {
    let app = setup_test_app().await;

    let (status, _) = app.send(get("/reported", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reported_products_for_admin() {
    let app = setup_test_app().await;
    app.seed_user("root@example.com", "admin").await;
    let admin = app.token_for("root@example.com");
    // A valid token for an email with no stored user is not an admin.
    let stranger = app.token_for("ghost@example.com");

    for product in [
        json!({"name": "Lens", "status": "reported"}),
        json!({"name": "Body", "status": "available"}),
    ] {
        app.send(json("POST", "/products", Some(&admin), product)).await;
    }

    let (status, _) = app.send(get("/reported", Some(&stranger))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reported) = app.send(get("/reported", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    let reported = reported.as_array().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0]["name"], "Lens");
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_lifecycle() {
    let app = setup_test_app().await;
    let token = app.token_for("seller@example.com");

    let (status, created) = app
        .send(json(
            "POST",
            "/products",
            Some(&token),
            json!({
                "name": "Canon AE-1",
                "category": "film",
                "sellerEmail": "seller@example.com",
                "price": "120.00"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["acknowledged"], true);
    let id = created["insertedId"].as_str().unwrap().to_string();

    let (status, product) = app.send(get(&format!("/products/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["_id"], id.as_str());
    assert_eq!(product["name"], "Canon AE-1");

    let (status, updated) = app
        .send(json(
            "PUT",
            &format!("/products/{id}"),
            Some(&token),
            json!({"isAdvertised": true}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["matchedCount"], 1);
    assert_eq!(updated["modifiedCount"], 1);

    let (_, product) = app.send(get(&format!("/products/{id}"), None)).await;
    assert_eq!(product["isAdvertised"], true);
    assert_eq!(product["name"], "Canon AE-1");

    let (status, deleted) = app
        .send(delete(&format!("/products/{id}"), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedCount"], 1);

    let (status, body) = app.send(get(&format!("/products/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_product_writes_require_auth() {
    let app = setup_test_app().await;

    let (status, _) = app
        .send(json("POST", "/products", None, json!({"name": "Lens"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let id = uuid::Uuid::new_v4();
    let (status, _) = app.send(delete(&format!("/products/{id}"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_product_body_is_400() {
    let app = setup_test_app().await;
    let token = app.token_for("sam@example.com");

    let (status, body) = app
        .send(json("POST", "/products", Some(&token), json!([1, 2])))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_product_id_is_400() {
    let app = setup_test_app().await;

    let (status, body) = app.send(get("/products/not-a-uuid", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_product_queries() {
    let app = setup_test_app().await;
    let token = app.token_for("seller@example.com");

    for product in [
        json!({"name": "A", "category": "dslr", "sellerEmail": "seller@example.com"}),
        json!({"name": "B", "category": "dslr", "sellerEmail": "other@example.com"}),
        json!({
            "name": "C",
            "category": "mirrorless",
            "sellerEmail": "seller@example.com",
            "isAdvertised": true
        }),
    ] {
        app.send(json("POST", "/products", Some(&token), product)).await;
    }

    let (_, all) = app.send(get("/products", None)).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, dslr) = app.send(get("/products/camera?category=dslr", None)).await;
    assert_eq!(dslr.as_array().unwrap().len(), 2);

    let (_, mine) = app
        .send(get("/products/seller?email=seller@example.com", None))
        .await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, _) = app.send(get("/products/seller", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, advertised) = app.send(get("/advertised/v2", None)).await;
    let advertised = advertised.as_array().unwrap();
    assert_eq!(advertised.len(), 1);
    assert_eq!(advertised[0]["name"], "C");
}

#[tokio::test]
async fn test_advertised_listings() {
    let app = setup_test_app().await;
    let token = app.token_for("seller@example.com");

    let (status, created) = app
        .send(json(
            "POST",
            "/products/advertised",
            Some(&token),
            json!({"productName": "Leica M6", "price": 2500}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(created["insertedId"].is_string());

    let (_, listings) = app.send(get("/advertised", None)).await;
    let listings = listings.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["productName"], "Leica M6");

    // Advertised listings are not products.
    let (_, products) = app.send(get("/products", None)).await;
    assert!(products.as_array().unwrap().is_empty());
}

// =============================================================================
// Bookings
// =============================================================================

#[tokio::test]
async fn test_bookings_by_buyer_and_id() {
    let app = setup_test_app().await;
    let token = app.token_for("buyer@example.com");

    let (status, created) = app
        .send(json(
            "POST",
            "/bookings",
            Some(&token),
            json!({
                "buyerEmail": "buyer@example.com",
                "productName": "Canon AE-1",
                "price": "120.00"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["insertedId"].as_str().unwrap().to_string();

    app.send(json(
        "POST",
        "/bookings",
        Some(&token),
        json!({"buyerEmail": "someone@example.com", "productName": "Nikon F3"}),
    ))
    .await;

    let (status, mine) = app
        .send(get("/bookings/buyer@example.com", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["productName"], "Canon AE-1");

    let (status, booking) = app.send(get(&format!("/bookings/product/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["buyerEmail"], "buyer@example.com");

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .send(get(&format!("/bookings/product/{missing}"), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bookings_list_requires_auth() {
    let app = setup_test_app().await;

    let (status, _) = app.send(get("/bookings/buyer@example.com", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
