//! Media storage on an S3-compatible object store
//!
//! Handles upload, delete, and URL generation for media files.
//! Files are served via a Custom Domain (CDN) in front of the bucket.

use aws_sdk_s3::Client as S3Client;

use super::staging::StagedFile;
use crate::error::AppError;
use crate::metrics::{MEDIA_BYTES_UPLOADED, MEDIA_DELETES_TOTAL, MEDIA_UPLOADS_TOTAL};

/// Media storage service
///
/// Uploads media to the object store and returns public URLs.
pub struct MediaStorage {
    /// S3-compatible client
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

/// Classify a stored object by its file extension, for logging and
/// metrics on best-effort deletes.
fn resource_kind(key: &str) -> &'static str {
    match mime_guess::from_path(key).first() {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => "image",
        Some(mime) if mime.type_() == mime_guess::mime::VIDEO => "video",
        _ => "other",
    }
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(
        config: &crate::config::MediaStorageConfig,
        object_store: &crate::config::ObjectStoreConfig,
    ) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2-style endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!(
            "https://{}.r2.cloudflarestorage.com",
            object_store.account_id
        );

        let credentials = Credentials::new(
            &object_store.access_key_id,
            &object_store.secret_access_key,
            None,
            None,
            "cliptide-object-store",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        })
    }

    /// Upload media bytes
    ///
    /// # Returns
    /// Public URL for the uploaded file
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let bytes = data.len() as f64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("object-store upload failed: {}", e)))?;

        MEDIA_UPLOADS_TOTAL
            .with_label_values(&[resource_kind(key)])
            .inc();
        MEDIA_BYTES_UPLOADED.inc_by(bytes);

        Ok(self.get_public_url(key))
    }

    /// Commit a staged upload to the object store.
    pub async fn upload_staged(
        &self,
        staged: &StagedFile,
        key: &str,
        content_type: &str,
    ) -> Result<String, AppError> {
        let data = staged.read().await?;
        self.upload(key, data, content_type).await
    }

    /// Upload an avatar image. Stored under the avatars/ prefix.
    pub async fn upload_avatar(
        &self,
        id: &str,
        staged: &StagedFile,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = format!("avatars/{}.{}", id, extension_for(content_type));
        self.upload_staged(staged, &key, content_type).await
    }

    /// Upload a cover image. Stored under the covers/ prefix.
    pub async fn upload_cover_image(
        &self,
        id: &str,
        staged: &StagedFile,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = format!("covers/{}.{}", id, extension_for(content_type));
        self.upload_staged(staged, &key, content_type).await
    }

    /// Upload a video thumbnail. Stored under the thumbnails/ prefix.
    pub async fn upload_thumbnail(
        &self,
        id: &str,
        staged: &StagedFile,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = format!("thumbnails/{}.{}", id, extension_for(content_type));
        self.upload_staged(staged, &key, content_type).await
    }

    /// Upload a video file. Stored under the videos/ prefix.
    pub async fn upload_video(
        &self,
        id: &str,
        staged: &StagedFile,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = format!("videos/{}.{}", id, extension_for(content_type));
        self.upload_staged(staged, &key, content_type).await
    }

    /// Best-effort removal of a stored asset by its public URL.
    ///
    /// Derives the object key from the URL; an asset that is already
    /// absent (or a URL outside our public domain) reports failure
    /// without raising.
    pub async fn delete_by_url(&self, url: &str) -> bool {
        let Some(key) = self.key_from_url(url) else {
            tracing::warn!(%url, "asset URL outside the media domain; skipping delete");
            MEDIA_DELETES_TOTAL.with_label_values(&["skipped"]).inc();
            return false;
        };

        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => {
                MEDIA_DELETES_TOTAL.with_label_values(&["success"]).inc();
                true
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    key,
                    kind = resource_kind(&key),
                    "object-store delete failed"
                );
                MEDIA_DELETES_TOTAL.with_label_values(&["error"]).inc();
                false
            }
        }
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", self.public_url.trim_end_matches('/')))
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Get public URL for an object key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), key)
    }
}
