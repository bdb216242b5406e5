//! API layer
//!
//! HTTP handlers for the versioned REST surface, grouped per resource.
//! Authentication is enforced by the `CurrentUser` extractor in
//! handlers.

mod comments;
mod dashboard;
mod dto;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

pub use dto::*;

use axum::{Json, Router, routing::get};

use crate::AppState;
use crate::error::AppError;

/// Compose the `/api/v1` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/tweets", tweets::router())
        .nest("/likes", likes::router())
        .nest("/playlists", playlists::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/dashboard", dashboard::router())
}

async fn healthcheck() -> Json<ApiBody<serde_json::Value>> {
    Json(ApiBody::ok("service is healthy", serde_json::json!({"status": "ok"})))
}

// =============================================================================
// Shared multipart helpers
// =============================================================================

pub(crate) const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub(crate) const MAX_VIDEO_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub(crate) const SUPPORTED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/gif"];
pub(crate) const SUPPORTED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm"];

/// A file field buffered out of a multipart stream.
pub(crate) struct UploadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Buffer a multipart file field, enforcing a size ceiling.
pub(crate) async fn read_file_field(
    mut field: axum::extract::multipart::Field<'_>,
    max_bytes: usize,
) -> Result<UploadedFile, AppError> {
    let content_type = field
        .content_type()
        .map(ToString::to_string)
        .ok_or_else(|| {
            AppError::Validation("missing content type for uploaded file".to_string())
        })?;

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read uploaded file: {}", e)))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "file too large: exceeds {} bytes",
                max_bytes
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        bytes,
        content_type,
    })
}

pub(crate) fn ensure_supported_type(
    content_type: &str,
    supported: &[&str],
) -> Result<(), AppError> {
    if supported.contains(&content_type) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "unsupported MIME type: {}",
            content_type
        )))
    }
}

/// Read a text field out of a multipart stream.
pub(crate) async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read form field: {}", e)))
}
