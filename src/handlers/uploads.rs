use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::post,
    Router,
};

use super::common::created_response;
use crate::errors::ServiceError;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/admin/uploads",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = crate::services::uploads::UploadResult),
        (status = 400, description = "Missing file, unsupported type, or over the size limit", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::ValidationError(format!("Failed to read upload: {}", e)))?;

        let result = state
            .uploads
            .store_product_image(&filename, &content_type, data)
            .await?;
        return Ok(created_response(result));
    }

    Err(ServiceError::ValidationError(
        "No file provided".to_string(),
    ))
}

/// Creates the router for admin upload endpoints
pub fn admin_upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/uploads", post(upload_image))
        // a little headroom over the 5 MiB payload limit for multipart framing
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
}
