mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use devfolio_api::entities::{category, product};
use devfolio_api::entities::user::UserRole;

use common::{response_json, TestApp};

#[tokio::test]
async fn health_reports_store_state() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "configured");

    let app = TestApp::unconfigured();
    let response = app.request(Method::GET, "/health", None, None).await;
    let body = response_json(response).await;
    assert_eq!(body["database"], "unconfigured");
}

#[tokio::test]
async fn public_catalog_answers_without_a_store() {
    let app = TestApp::unconfigured();

    let response = app.request(Method::GET, "/api/v1/products", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(!body.as_array().unwrap().is_empty());

    let response = app
        .request(Method::GET, "/api/v1/categories", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            "/api/v1/products/sistem-manajemen-bimbel",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["slug"], "sistem-manajemen-bimbel");
    // image wire format exposes "order", not "sort_order"
    assert!(body["images"][0]["order"].is_number());
}

#[tokio::test]
async fn unknown_slug_is_a_structured_404() {
    let app = TestApp::unconfigured();
    let response = app
        .request(Method::GET, "/api/v1/products/no-such-thing", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn admin_routes_reject_missing_and_non_admin_tokens() {
    let app = TestApp::new().await;
    let payload = json!({ "name": "Intruder", "category_id": uuid::Uuid::new_v4() });

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/products",
            Some(payload.clone()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = app.user_token();
    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/products",
            Some(payload.clone()),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/products",
            Some(payload),
            Some("garbage-token"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // none of the rejected calls wrote anything
    let count = product::Entity::find().count(app.db()).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn login_then_manage_catalog_end_to_end() {
    let app = TestApp::new().await;
    app.seed_user("admin@site.test", "admin123", UserRole::Admin)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "admin@site.test", "password": "admin123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/categories",
            Some(json!({ "name": "Pendidikan" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = response_json(response).await;
    assert_eq!(category["slug"], "pendidikan");

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "name": "Sistem Manajemen Bimbel",
                "short_description": "Short",
                "description": "Long",
                "price": "8000000",
                "category_id": category["id"],
                "features": ["Absensi"],
                "tech_stack": ["Laravel"],
                "images": [{ "url": "https://img.test/a.png" }]
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = response_json(response).await;
    assert_eq!(product["slug"], "sistem-manajemen-bimbel");
    assert_eq!(product["price"], "8000000");

    // the live row now shadows the fallback catalog on the public surface
    let response = app.request(Method::GET, "/api/v1/products", None, None).await;
    let listing = response_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let id = product["id"].as_str().unwrap().to_string();
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/admin/products/{id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);

    // change-password responds with a human-readable confirmation
    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/change-password",
            Some(json!({ "current_password": "admin123", "new_password": "longer-password" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn bad_login_is_unauthorized() {
    let app = TestApp::new().await;
    app.seed_user("admin@site.test", "admin123", UserRole::Admin)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "admin@site.test", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn settings_round_trip_through_the_api() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    let response = app.request(Method::GET, "/api/v1/settings", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let defaults = response_json(response).await;
    assert_eq!(defaults["priceDisplayMode"], "hide");

    let response = app
        .request(
            Method::PUT,
            "/api/v1/admin/settings",
            Some(json!({ "siteName": "Toko Digital", "showDemoButton": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/settings", None, None).await;
    let merged = response_json(response).await;
    assert_eq!(merged["siteName"], "Toko Digital");
    assert_eq!(merged["showDemoButton"], true);
    // untouched keys keep their defaults
    assert_eq!(merged["priceDisplayMode"], "hide");

    let response = app
        .request(
            Method::PUT,
            "/api/v1/admin/settings",
            Some(json!({ "whatsappNumber": "123" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn writes_fail_loudly_without_a_store() {
    let app = TestApp::unconfigured();
    let token = app.admin_token();

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/categories",
            Some(json!({ "name": "Bisnis" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::unconfigured();
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"]["/api/v1/products"].is_object());
}

#[tokio::test]
async fn category_listing_uses_live_rows_once_present() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    app.request(
        Method::POST,
        "/api/v1/admin/categories",
        Some(json!({ "name": "Kustom" })),
        Some(&token),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/categories", None, None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["slug"], "kustom");

    let stored = category::Entity::find().count(app.db()).await.unwrap();
    assert_eq!(stored, 1);
}
