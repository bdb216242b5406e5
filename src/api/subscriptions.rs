//! Subscription endpoints
//!
//! The toggle is atomic on the unique (subscriber, channel) index.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use super::{ApiBody, SubscriptionToggleResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::UserSummary;
use crate::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/:channel_id", post(toggle_subscription))
        .route("/subscribers/:channel_id", get(channel_subscribers))
        .route("/channels/:user_id", get(subscribed_channels))
}

/// POST /api/v1/subscriptions/toggle/:channel_id
async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiBody<SubscriptionToggleResponse>>, AppError> {
    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let subscribed = state.db.toggle_subscription(&user.id, &channel_id).await?;

    let message = if subscribed {
        "subscribed successfully"
    } else {
        "unsubscribed successfully"
    };

    Ok(Json(ApiBody::ok(
        message,
        SubscriptionToggleResponse {
            channel_id,
            subscribed,
        },
    )))
}

/// GET /api/v1/subscriptions/subscribers/:channel_id
async fn channel_subscribers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiBody<Vec<UserSummary>>>, AppError> {
    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let subscribers = state.db.channel_subscribers(&channel_id).await?;

    Ok(Json(ApiBody::ok(
        "subscribers fetched successfully",
        subscribers,
    )))
}

/// GET /api/v1/subscriptions/channels/:user_id
async fn subscribed_channels(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiBody<Vec<UserSummary>>>, AppError> {
    state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let channels = state.db.subscribed_channels(&user_id).await?;

    Ok(Json(ApiBody::ok(
        "subscribed channels fetched successfully",
        channels,
    )))
}
