//! Tweet endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;

use super::{ApiBody, Page, TweetResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, Tweet};
use crate::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:username", get(user_tweets))
        .route("/:tweet_id", patch(update_tweet))
        .route("/:tweet_id", delete(delete_tweet))
}

#[derive(Debug, Deserialize)]
struct TweetRequest {
    content: String,
}

/// POST /api/v1/tweets
async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<TweetRequest>,
) -> Result<(StatusCode, Json<ApiBody<TweetResponse>>), AppError> {
    let content = request.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation(
            "please write something first".to_string(),
        ));
    }

    let now = chrono::Utc::now();
    let tweet = Tweet {
        id: EntityId::new().0,
        content,
        owner_id: user.id,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_tweet(&tweet).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiBody::ok("tweet published successfully", tweet.into())),
    ))
}

#[derive(Debug, Deserialize)]
struct PaginationParams {
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /api/v1/tweets/user/:username
async fn user_tweets(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(username): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiBody<Page<TweetResponse>>>, AppError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::Validation("please enter a username".to_string()));
    }

    let owner = state
        .db
        .get_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let (tweets, total) = state.db.list_user_tweets(&owner.id, page, limit).await?;

    Ok(Json(ApiBody::ok(
        "tweets fetched successfully",
        Page::new(tweets.into_iter().map(Into::into).collect(), total, page, limit),
    )))
}

/// PATCH /api/v1/tweets/:tweet_id
async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
    Json(request): Json<TweetRequest>,
) -> Result<Json<ApiBody<TweetResponse>>, AppError> {
    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if tweet.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    let content = request.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation(
            "updated tweet cannot be empty".to_string(),
        ));
    }

    let updated = state
        .db
        .update_tweet_content(&tweet_id, &content)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ApiBody::ok(
        "tweet updated successfully",
        updated.into(),
    )))
}

/// DELETE /api/v1/tweets/:tweet_id
async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if tweet.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    state.db.delete_tweet(&tweet_id).await?;

    Ok(Json(ApiBody::ok(
        "tweet deleted successfully",
        serde_json::json!({}),
    )))
}
