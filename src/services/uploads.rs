use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::errors::ServiceError;

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResult {
    pub url: String,
    pub path: String,
}

/// Blob persistence port. The service decides names and policy; the store
/// only writes bytes and reports the public URL they are reachable at.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> anyhow::Result<String>;
}

/// Filesystem-backed blob store serving files under a public base path.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &str, data: Bytes, _content_type: &str) -> anyhow::Result<String> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, &data).await?;
        Ok(format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            path
        ))
    }
}

/// Validates and stores product images.
pub struct UploadService {
    store: Box<dyn BlobStore>,
}

impl UploadService {
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Store one product image. Rejects missing data, non-image content
    /// types, and payloads over 5 MiB before touching the blob store.
    #[instrument(skip(self, data), fields(size = data.len(), content_type = %content_type))]
    pub async fn store_product_image(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<UploadResult, ServiceError> {
        if data.is_empty() {
            return Err(ServiceError::ValidationError(
                "No file provided".to_string(),
            ));
        }
        if !ALLOWED_TYPES.contains(&content_type) {
            return Err(ServiceError::ValidationError(format!(
                "Unsupported file type '{}': expected JPEG, PNG, GIF or WebP",
                content_type
            )));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::ValidationError(
                "File exceeds the 5 MB limit".to_string(),
            ));
        }

        let path = format!("products/{}", unique_name(filename));
        let url = self
            .store
            .put(&path, data, content_type)
            .await
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        info!(%path, "Stored product image");
        Ok(UploadResult { url, path })
    }
}

/// Collision-resistant object name: epoch millis, a random suffix, and the
/// sanitized extension of the original filename.
fn unique_name(original: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    match sanitized_extension(original) {
        Some(ext) => format!("{}-{}.{}", millis, suffix, ext),
        None => format!("{}-{}", millis, suffix),
    }
}

fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    let clean: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect::<String>()
        .to_lowercase();
    if clean.is_empty() {
        None
    } else {
        Some(clean)
    }
}
