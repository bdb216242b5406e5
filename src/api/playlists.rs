//! Playlist endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;

use super::{ApiBody, PlaylistDetailResponse, PlaylistResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, Playlist};
use crate::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/:user_id", get(user_playlists))
        .route("/:playlist_id", get(get_playlist))
        .route("/:playlist_id", patch(update_playlist))
        .route("/:playlist_id", delete(delete_playlist))
        .route("/:playlist_id/videos/:video_id", patch(add_video))
        .route("/:playlist_id/videos/:video_id", delete(remove_video))
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistRequest {
    name: String,
    #[serde(default)]
    description: String,
}

/// POST /api/v1/playlists
async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<ApiBody<PlaylistResponse>>), AppError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name field is empty".to_string()));
    }

    if state.db.playlist_name_exists(&user.id, &name).await? {
        return Err(AppError::Conflict(
            "playlist with this name already exists".to_string(),
        ));
    }

    let now = chrono::Utc::now();
    let playlist = Playlist {
        id: EntityId::new().0,
        name,
        description: request.description,
        owner_id: user.id,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_playlist(&playlist).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiBody::ok("playlist created successfully", playlist.into())),
    ))
}

/// GET /api/v1/playlists/user/:user_id
async fn user_playlists(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiBody<Vec<PlaylistResponse>>>, AppError> {
    state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let playlists = state.db.playlists_by_owner(&user_id).await?;

    Ok(Json(ApiBody::ok(
        "playlists fetched successfully",
        playlists.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/v1/playlists/:playlist_id
async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<Json<ApiBody<PlaylistDetailResponse>>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let videos = state.db.playlist_videos(&playlist_id).await?;

    Ok(Json(ApiBody::ok(
        "playlist found successfully",
        PlaylistDetailResponse {
            playlist: playlist.into(),
            videos: videos.into_iter().map(Into::into).collect(),
        },
    )))
}

#[derive(Debug, Deserialize)]
struct UpdatePlaylistRequest {
    name: Option<String>,
    description: Option<String>,
}

/// PATCH /api/v1/playlists/:playlist_id
async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
    Json(request): Json<UpdatePlaylistRequest>,
) -> Result<Json<ApiBody<PlaylistResponse>>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if playlist.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    let name = match request.name.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::Validation("name field is empty".to_string()));
        }
        Some(name) if name != playlist.name => {
            if state.db.playlist_name_exists(&user.id, name).await? {
                return Err(AppError::Conflict(
                    "playlist with this name already exists".to_string(),
                ));
            }
            Some(name)
        }
        other => other,
    };

    let updated = state
        .db
        .update_playlist(&playlist_id, name, request.description.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ApiBody::ok(
        "playlist updated successfully",
        updated.into(),
    )))
}

/// DELETE /api/v1/playlists/:playlist_id
async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if playlist.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    state.db.delete_playlist(&playlist_id).await?;

    Ok(Json(ApiBody::ok(
        "playlist deleted successfully",
        serde_json::json!({}),
    )))
}

/// PATCH /api/v1/playlists/:playlist_id/videos/:video_id
async fn add_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if playlist.owner_id != user.id {
        return Err(AppError::Forbidden);
    }
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;

    state.db.add_playlist_video(&playlist_id, &video_id).await?;

    Ok(Json(ApiBody::ok(
        "video added to playlist successfully",
        serde_json::json!({}),
    )))
}

/// DELETE /api/v1/playlists/:playlist_id/videos/:video_id
async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if playlist.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    let removed = state
        .db
        .remove_playlist_video(&playlist_id, &video_id)
        .await?;
    if removed == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(ApiBody::ok(
        "video removed from playlist successfully",
        serde_json::json!({}),
    )))
}
