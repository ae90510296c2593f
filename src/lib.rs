pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod mock;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::auth::{auth_middleware, role_middleware, AuthService};
use crate::config::AppConfig;
use crate::db::StoreHandle;
use crate::entities::user::UserRole;
use crate::services::catalog::CatalogService;
use crate::services::settings::{FileSettingsStore, SettingsService};
use crate::services::uploads::{LocalBlobStore, UploadService};

/// Shared application state handed to every handler.
pub struct AppState {
    pub config: AppConfig,
    pub store: StoreHandle,
    pub catalog: Arc<CatalogService>,
    pub settings: Arc<SettingsService>,
    pub uploads: Arc<UploadService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: StoreHandle) -> Self {
        let catalog = Arc::new(CatalogService::new(store.clone()));
        let settings = Arc::new(SettingsService::new(Box::new(FileSettingsStore::new(
            &config.settings_path,
        ))));
        let uploads = Arc::new(UploadService::new(Box::new(LocalBlobStore::new(
            &config.upload_dir,
            config.upload_base_url.clone(),
        ))));
        let auth = Arc::new(AuthService::new(
            store.clone(),
            config.fallback_admin.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration as i64,
        ));
        Self {
            config,
            store,
            catalog,
            settings,
            uploads,
            auth,
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.store {
        StoreHandle::Live(_) => "configured",
        StoreHandle::Unconfigured => "unconfigured",
    };
    Json(json!({ "status": "ok", "database": database }))
}

async fn openapi_json() -> impl IntoResponse {
    Json(openapi::ApiDoc::openapi())
}

/// Build the full application router: public catalog and settings, auth,
/// the admin subtree behind bearer-token and admin-role guards, health,
/// and the OpenAPI document.
pub fn app_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .merge(handlers::catalog::admin_catalog_routes())
        .merge(handlers::settings::admin_settings_routes())
        .merge(handlers::uploads::admin_upload_routes())
        .route("/change-password", post(handlers::auth::change_password))
        .route_layer(from_fn_with_state(UserRole::Admin, role_middleware))
        .route_layer(from_fn_with_state(state.auth.clone(), auth_middleware));

    let api_v1 = Router::new()
        .merge(handlers::catalog::catalog_routes())
        .merge(handlers::settings::settings_routes())
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/admin", admin);

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_v1)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
