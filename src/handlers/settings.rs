use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};

use super::common::success_response;
use crate::errors::ServiceError;
use crate::services::settings::SiteSettingsPatch;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses(
        (status = 200, description = "Effective site settings", body = crate::services::settings::SiteSettings)
    ),
    tag = "settings"
)]
pub async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    success_response(state.settings.get())
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/settings",
    request_body = SiteSettingsPatch,
    responses(
        (status = 200, description = "Merged settings after the update", body = crate::services::settings::SiteSettings),
        (status = 400, description = "Invalid WhatsApp number", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SiteSettingsPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let merged = state.settings.save(patch)?;
    Ok(success_response(merged))
}

/// Creates the router for the public settings endpoint
pub fn settings_routes() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings))
}

/// Creates the router for the admin settings endpoint
pub fn admin_settings_routes() -> Router<Arc<AppState>> {
    Router::new().route("/settings", put(update_settings))
}
