//! Like endpoints
//!
//! Toggles are atomic delete-if-matched / insert-or-ignore operations
//! keyed by the unique (liker, target) index.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use super::{ApiBody, LikeToggleResponse, VideoWithOwnerResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::LikeTarget;
use crate::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/video/:video_id", post(toggle_video_like))
        .route("/toggle/comment/:comment_id", post(toggle_comment_like))
        .route("/toggle/tweet/:tweet_id", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}

async fn toggle(
    state: &AppState,
    liker_id: &str,
    target: LikeTarget,
    target_id: &str,
) -> Result<Json<ApiBody<LikeToggleResponse>>, AppError> {
    let liked = state.db.toggle_like(liker_id, target, target_id).await?;

    let message = if liked {
        format!("{} liked successfully", target.as_str())
    } else {
        format!("like removed from {} successfully", target.as_str())
    };

    Ok(Json(ApiBody::ok(
        message,
        LikeToggleResponse {
            target: target.as_str(),
            liked,
        },
    )))
}

/// POST /api/v1/likes/toggle/video/:video_id
async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiBody<LikeToggleResponse>>, AppError> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;
    toggle(&state, &user.id, LikeTarget::Video, &video_id).await
}

/// POST /api/v1/likes/toggle/comment/:comment_id
async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiBody<LikeToggleResponse>>, AppError> {
    state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    toggle(&state, &user.id, LikeTarget::Comment, &comment_id).await
}

/// POST /api/v1/likes/toggle/tweet/:tweet_id
async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<Json<ApiBody<LikeToggleResponse>>, AppError> {
    state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;
    toggle(&state, &user.id, LikeTarget::Tweet, &tweet_id).await
}

/// GET /api/v1/likes/videos
async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiBody<Vec<VideoWithOwnerResponse>>>, AppError> {
    let videos = state.db.liked_videos(&user.id).await?;

    Ok(Json(ApiBody::ok(
        "liked videos fetched successfully",
        videos.into_iter().map(Into::into).collect(),
    )))
}
