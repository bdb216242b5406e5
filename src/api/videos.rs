//! Video endpoints
//!
//! All routes require authentication, matching the source router.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;

use super::{
    ApiBody, MAX_IMAGE_UPLOAD_BYTES, MAX_VIDEO_UPLOAD_BYTES, Page, SUPPORTED_IMAGE_TYPES,
    SUPPORTED_VIDEO_TYPES, UploadedFile, VideoResponse, VideoWithOwnerResponse,
    ensure_supported_type, read_file_field, read_text_field,
};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, SortDirection, VideoListQuery, VideoSortField};
use crate::error::AppError;
use crate::service::VideoService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos))
        .route("/publish", post(publish_video))
        .route("/:video_id", get(get_video))
        .route("/:video_id", patch(update_video))
        .route("/:video_id", delete(delete_video))
        .route("/toggle/publish/:video_id", patch(toggle_publish))
}

fn video_service(state: &AppState) -> VideoService {
    VideoService::new(state.db.clone(), state.storage.clone())
}

// =============================================================================
// Listing
// =============================================================================

#[derive(Debug, Deserialize)]
struct VideoListParams {
    page: Option<u32>,
    limit: Option<u32>,
    /// Case-insensitive substring on title
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    user_id: Option<String>,
}

impl VideoListParams {
    /// Resolve raw query parameters against the sort allow-list before
    /// anything touches the database.
    fn into_query(self) -> Result<VideoListQuery, AppError> {
        let sort_by = match self.sort_by.as_deref() {
            None => VideoSortField::CreatedAt,
            Some(raw) => VideoSortField::parse(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "invalid parameter for sort_by: {raw} (allowed: created_at, duration, views)"
                ))
            })?,
        };
        let sort_direction = match self.sort_type.as_deref() {
            None => SortDirection::default(),
            Some(raw) => SortDirection::parse(raw).ok_or_else(|| {
                AppError::Validation(
                    "sort_type must be either 'asc' or 'desc'".to_string(),
                )
            })?,
        };

        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(10).clamp(1, 100);

        Ok(VideoListQuery {
            title_query: self.query.filter(|q| !q.trim().is_empty()),
            owner_id: self.user_id,
            sort_by,
            sort_direction,
            page,
            limit,
        })
    }
}

/// GET /api/v1/videos
async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<VideoListParams>,
) -> Result<Json<ApiBody<Page<VideoWithOwnerResponse>>>, AppError> {
    let query = params.into_query()?;
    let (videos, total) = video_service(&state).list(&query).await?;

    let page = Page::new(
        videos.into_iter().map(Into::into).collect(),
        total,
        query.page,
        query.limit,
    );
    Ok(Json(ApiBody::ok("videos fetched successfully", page)))
}

// =============================================================================
// Publishing
// =============================================================================

#[derive(Default)]
struct PublishForm {
    title: Option<String>,
    description: Option<String>,
    video: Option<UploadedFile>,
    thumbnail: Option<UploadedFile>,
}

async fn parse_publish_form(mut multipart: Multipart) -> Result<PublishForm, AppError> {
    let mut form = PublishForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "title" => form.title = Some(read_text_field(field).await?),
            "description" => form.description = Some(read_text_field(field).await?),
            "video" => {
                let file = read_file_field(field, MAX_VIDEO_UPLOAD_BYTES).await?;
                ensure_supported_type(&file.content_type, SUPPORTED_VIDEO_TYPES)?;
                form.video = Some(file);
            }
            "thumbnail" => {
                let file = read_file_field(field, MAX_IMAGE_UPLOAD_BYTES).await?;
                ensure_supported_type(&file.content_type, SUPPORTED_IMAGE_TYPES)?;
                form.thumbnail = Some(file);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/v1/videos/publish
async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiBody<VideoResponse>>), AppError> {
    let form = parse_publish_form(multipart).await?;

    let video = form
        .video
        .ok_or_else(|| AppError::Validation("please upload a video file".to_string()))?;
    let thumbnail = form
        .thumbnail
        .ok_or_else(|| AppError::Validation("please upload a thumbnail image".to_string()))?;
    let title = form
        .title
        .ok_or_else(|| AppError::Validation("title field is empty".to_string()))?;

    let staged_video = state.staging.stage(&video.bytes)?;
    let staged_thumbnail = state.staging.stage(&thumbnail.bytes)?;

    let published = video_service(&state)
        .publish(
            &user.id,
            title,
            form.description.unwrap_or_default(),
            staged_video,
            &video.content_type,
            staged_thumbnail,
            &thumbnail.content_type,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiBody::ok("video published successfully", published.into())),
    ))
}

// =============================================================================
// Single video
// =============================================================================

/// GET /api/v1/videos/:video_id
///
/// Counts the view and records the caller's watch history.
async fn get_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiBody<VideoWithOwnerResponse>>, AppError> {
    let video = video_service(&state).watch(&video_id, &user.id).await?;
    Ok(Json(ApiBody::ok("video fetched successfully", video.into())))
}

#[derive(Default)]
struct UpdateVideoForm {
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<UploadedFile>,
}

async fn parse_update_form(mut multipart: Multipart) -> Result<UpdateVideoForm, AppError> {
    let mut form = UpdateVideoForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "title" => form.title = Some(read_text_field(field).await?),
            "description" => form.description = Some(read_text_field(field).await?),
            "thumbnail" => {
                let file = read_file_field(field, MAX_IMAGE_UPLOAD_BYTES).await?;
                ensure_supported_type(&file.content_type, SUPPORTED_IMAGE_TYPES)?;
                form.thumbnail = Some(file);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// PATCH /api/v1/videos/:video_id
async fn update_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiBody<VideoResponse>>, AppError> {
    let form = parse_update_form(multipart).await?;

    // Commit the replacement thumbnail before touching the document so
    // a storage failure leaves the video unchanged.
    let new_thumbnail_url = match &form.thumbnail {
        Some(file) => {
            let staged = state.staging.stage(&file.bytes)?;
            Some(
                state
                    .storage
                    .upload_thumbnail(&EntityId::new().0, &staged, &file.content_type)
                    .await?,
            )
        }
        None => None,
    };

    let (video, replaced_thumbnail) = video_service(&state)
        .update_metadata(
            &video_id,
            &user.id,
            form.title.as_deref(),
            form.description.as_deref(),
            new_thumbnail_url.as_deref(),
        )
        .await?;

    if let Some(replaced) = replaced_thumbnail {
        state.storage.delete_by_url(&replaced).await;
    }

    Ok(Json(ApiBody::ok("video updated successfully", video.into())))
}

/// DELETE /api/v1/videos/:video_id
async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    video_service(&state).delete(&video_id, &user.id).await?;

    Ok(Json(ApiBody::ok(
        "video deleted successfully",
        serde_json::json!({}),
    )))
}

/// PATCH /api/v1/videos/toggle/publish/:video_id
async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiBody<VideoResponse>>, AppError> {
    let video = video_service(&state)
        .toggle_publish(&video_id, &user.id)
        .await?;

    Ok(Json(ApiBody::ok(
        "publish status toggled successfully",
        video.into(),
    )))
}
