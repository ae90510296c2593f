use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::common::{success_response, validate_input};
use crate::auth::Principal;
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "email": "admin@example.com",
    "password": "admin123"
}))]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: Principal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,

    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Bad credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let principal = state
        .auth
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

    let access_token = state.auth.generate_token(&principal)?;
    info!(email = %principal.email, "User logged in");
    Ok(success_response(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.token_ttl_secs(),
        user: principal,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password incorrect or new password too weak", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 503, description = "No user store configured", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    state
        .auth
        .change_password(
            principal.id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(success_response(
        json!({ "message": "Password updated successfully" }),
    ))
}

/// Creates the router for public auth endpoints
pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}
