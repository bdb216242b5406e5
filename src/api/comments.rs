//! Comment endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;

use super::{ApiBody, CommentResponse, CommentWithOwnerResponse, Page};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Comment, EntityId};
use crate::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:video_id", get(list_comments))
        .route("/:video_id", post(add_comment))
        .route("/c/:comment_id", patch(update_comment))
        .route("/c/:comment_id", delete(delete_comment))
}

#[derive(Debug, Deserialize)]
struct PaginationParams {
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /api/v1/comments/:video_id
async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiBody<Page<CommentWithOwnerResponse>>>, AppError> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let (comments, total) = state.db.list_video_comments(&video_id, page, limit).await?;

    Ok(Json(ApiBody::ok(
        "comments fetched successfully",
        Page::new(comments.into_iter().map(Into::into).collect(), total, page, limit),
    )))
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
}

/// POST /api/v1/comments/:video_id
async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<ApiBody<CommentResponse>>), AppError> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let content = request.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation(
            "cannot make an empty comment, please write something".to_string(),
        ));
    }

    let now = chrono::Utc::now();
    let comment = Comment {
        id: EntityId::new().0,
        content,
        owner_id: user.id,
        video_id,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_comment(&comment).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiBody::ok("your comment was sent", comment.into())),
    ))
}

/// PATCH /api/v1/comments/c/:comment_id
async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<ApiBody<CommentResponse>>, AppError> {
    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if comment.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    let content = request.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation(
            "updated comment cannot be empty".to_string(),
        ));
    }

    let updated = state
        .db
        .update_comment_content(&comment_id, &content)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ApiBody::ok(
        "comment updated successfully",
        updated.into(),
    )))
}

/// DELETE /api/v1/comments/c/:comment_id
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if comment.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    state.db.delete_comment(&comment_id).await?;

    Ok(Json(ApiBody::ok(
        "comment deleted successfully",
        serde_json::json!({}),
    )))
}
