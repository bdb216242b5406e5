//! Video service
//!
//! Publishing, retrieval with view counting, metadata updates, deletion
//! with remote cleanup, listing, and the channel dashboard views.

use std::sync::Arc;

use crate::data::{
    ChannelStats, Database, EntityId, Video, VideoListQuery, VideoWithOwner,
};
use crate::error::AppError;
use crate::storage::{MediaStorage, StagedFile, staging};

/// Video service
pub struct VideoService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl VideoService {
    /// Create new video service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    /// Publish a new video from staged uploads.
    ///
    /// The staged files are consumed; their transient copies are
    /// removed on drop whichever way this returns. A failure after the
    /// remote upload but before the document insert leaves an orphaned
    /// remote asset, reconciled out-of-band.
    pub async fn publish(
        &self,
        owner_id: &str,
        title: String,
        description: String,
        video_file: StagedFile,
        video_content_type: &str,
        thumbnail_file: StagedFile,
        thumbnail_content_type: &str,
    ) -> Result<Video, AppError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title field is empty".to_string()));
        }

        let video_id = EntityId::new().0;
        let duration = staging::video_duration_seconds(video_file.path());

        let video_url = self
            .storage
            .upload_video(&video_id, &video_file, video_content_type)
            .await?;
        let thumbnail_url = self
            .storage
            .upload_thumbnail(&video_id, &thumbnail_file, thumbnail_content_type)
            .await?;

        let now = chrono::Utc::now();
        let video = Video {
            id: video_id,
            owner_id: owner_id.to_string(),
            video_url,
            thumbnail_url,
            title,
            description,
            duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_video(&video).await?;
        crate::metrics::VIDEOS_PUBLISHED_TOTAL.inc();

        tracing::info!(video_id = %video.id, owner = %owner_id, "video published");
        Ok(video)
    }

    /// Fetch a video for a viewer, counting the view and recording
    /// watch history. Unpublished videos are only visible to their
    /// owner.
    pub async fn watch(
        &self,
        video_id: &str,
        viewer_id: &str,
    ) -> Result<VideoWithOwner, AppError> {
        let video = self
            .db
            .get_video_with_owner(video_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !video.is_published && video.owner_id != viewer_id {
            return Err(AppError::NotFound);
        }

        self.db.increment_video_views(video_id).await?;
        self.db.record_watch(viewer_id, video_id).await?;

        Ok(VideoWithOwner {
            views: video.views + 1,
            ..video
        })
    }

    /// Owner-only metadata update; returns the replaced thumbnail URL
    /// when a new one was committed so the caller can delete the old
    /// remote asset.
    pub async fn update_metadata(
        &self,
        video_id: &str,
        requester_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        new_thumbnail_url: Option<&str>,
    ) -> Result<(Video, Option<String>), AppError> {
        let existing = self
            .db
            .get_video(video_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if existing.owner_id != requester_id {
            return Err(AppError::Forbidden);
        }

        if let Some(title) = title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("title field is empty".to_string()));
            }
        }

        let replaced_thumbnail = new_thumbnail_url.map(|_| existing.thumbnail_url.clone());
        let video = self
            .db
            .update_video_metadata(video_id, title, description, new_thumbnail_url)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok((video, replaced_thumbnail))
    }

    /// Owner-only deletion.
    ///
    /// Remote assets are removed best-effort first; if the document
    /// delete then fails, the inconsistency is surfaced as a
    /// distinguished partial-completion error rather than a generic
    /// failure.
    pub async fn delete(&self, video_id: &str, requester_id: &str) -> Result<(), AppError> {
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if video.owner_id != requester_id {
            return Err(AppError::Forbidden);
        }

        let media_removed = self.storage.delete_by_url(&video.video_url).await;
        let thumbnail_removed = self.storage.delete_by_url(&video.thumbnail_url).await;

        match self.db.delete_video(video_id).await {
            Ok(_) => Ok(()),
            Err(error) if media_removed || thumbnail_removed => {
                tracing::error!(
                    %error,
                    video_id,
                    "video document delete failed after remote assets were removed"
                );
                Err(AppError::PartialCompletion(format!(
                    "remote assets removed but the video record could not be deleted: {}",
                    error
                )))
            }
            Err(error) => Err(error),
        }
    }

    /// Owner-only publish flag flip.
    pub async fn toggle_publish(
        &self,
        video_id: &str,
        requester_id: &str,
    ) -> Result<Video, AppError> {
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if video.owner_id != requester_id {
            return Err(AppError::Forbidden);
        }

        self.db
            .set_video_published(video_id, !video.is_published)
            .await?;
        self.db
            .get_video(video_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Composed public listing. When an owner filter is supplied, the
    /// channel must exist.
    pub async fn list(
        &self,
        query: &VideoListQuery,
    ) -> Result<(Vec<VideoWithOwner>, i64), AppError> {
        if let Some(owner_id) = &query.owner_id {
            self.db
                .get_user(owner_id)
                .await?
                .ok_or(AppError::NotFound)?;
        }
        self.db.list_videos(query).await
    }

    /// Live dashboard statistics for a channel.
    pub async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, AppError> {
        self.db
            .get_user(channel_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.channel_stats(channel_id).await
    }

    /// All of a channel's videos for the owner dashboard, including
    /// unpublished ones.
    pub async fn channel_videos(&self, channel_id: &str) -> Result<Vec<Video>, AppError> {
        self.db
            .get_user(channel_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.channel_videos(channel_id).await
    }
}
