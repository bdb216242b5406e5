//! Channel dashboard endpoints
//!
//! Read-only derived views, always computed live.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::{ApiBody, VideoResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::ChannelStats;
use crate::error::AppError;
use crate::service::VideoService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:channel_id/stats", get(channel_stats))
        .route("/:channel_id/videos", get(channel_videos))
}

/// GET /api/v1/dashboard/:channel_id/stats
async fn channel_stats(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiBody<ChannelStats>>, AppError> {
    let stats = VideoService::new(state.db.clone(), state.storage.clone())
        .channel_stats(&channel_id)
        .await?;

    Ok(Json(ApiBody::ok("dashboard data fetched successfully", stats)))
}

/// GET /api/v1/dashboard/:channel_id/videos
async fn channel_videos(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiBody<Vec<VideoResponse>>>, AppError> {
    let videos = VideoService::new(state.db.clone(), state.storage.clone())
        .channel_videos(&channel_id)
        .await?;

    Ok(Json(ApiBody::ok(
        "channel videos fetched successfully",
        videos.into_iter().map(Into::into).collect(),
    )))
}
