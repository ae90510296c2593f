use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;

use serde_json::json;

use super::common::{created_response, success_response};
use crate::errors::ServiceError;
use crate::services::catalog::{CategoryInput, ProductFilter, ProductInput};
use crate::AppState;

// Public surface. These endpoints never fail on storage trouble; the
// service substitutes the static fallback catalog instead.

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "All categories, ordered by name", body = [crate::services::catalog::CategoryView])
    ),
    tag = "catalog"
)]
pub async fn list_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    success_response(state.catalog.list_categories().await)
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Active products matching the filter, newest first", body = [crate::services::catalog::ProductView])
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProductFilter>,
) -> impl IntoResponse {
    success_response(state.catalog.list_products(filter).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/products/:slug",
    params(("slug" = String, Path, description = "Product slug, or a product id")),
    responses(
        (status = 200, description = "Product returned", body = crate::services::catalog::ProductView),
        (status = 404, description = "No product with that slug", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_product_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.get_product_by_slug(&slug).await?;
    Ok(success_response(product))
}

// Admin surface. Requires an admin bearer token and a configured store;
// there is no fallback here.

#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    responses(
        (status = 200, description = "All products, every status", body = [crate::services::catalog::ProductView]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_products_admin(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.catalog.list_products_admin().await?;
    Ok(success_response(products))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::services::catalog::ProductView),
        (status = 400, description = "Invalid input or duplicate slug", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.create_product(input).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product replaced", body = crate::services::catalog::ProductView),
        (status = 400, description = "Invalid input or duplicate slug", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.update_product(id, input).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted (idempotent)"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.catalog.delete_product(id).await?;
    Ok(success_response(json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = crate::services::catalog::CategoryView),
        (status = 400, description = "Invalid input or duplicate slug", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.catalog.create_category(input).await?;
    Ok(created_response(category))
}

/// Creates the router for public catalog endpoints
pub fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/products", get(list_products))
        .route("/products/:slug", get(get_product_by_slug))
}

/// Creates the router for admin catalog endpoints
pub fn admin_catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products_admin))
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product))
        .route("/products/:id", delete(delete_product))
        .route("/categories", post(create_category))
}
