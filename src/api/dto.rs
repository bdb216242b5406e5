//! API response DTOs
//!
//! Outward representations of entities. User-derived responses are
//! built from projections that never include the password or
//! refresh-token fields.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{
    Comment, CommentWithOwner, Playlist, Tweet, User, UserSummary, Video, VideoWithOwner,
};

/// Success envelope: status is carried by HTTP, the body repeats a
/// human-readable message next to the payload.
#[derive(Debug, Serialize)]
pub struct ApiBody<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiBody<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Paginated collection payload
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            (total + i64::from(limit) - 1) / i64::from(limit)
        };
        Self {
            items,
            total,
            page,
            total_pages,
        }
    }
}

/// User representation (credentials stripped)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login/refresh payload: tokens are also set as cookies, the body copy
/// serves clients without a cookie jar.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token-only payload for the refresh endpoint
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Video representation
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: String,
    pub owner_id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            owner_id: video.owner_id,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
        }
    }
}

/// Video with its owner projection
#[derive(Debug, Serialize)]
pub struct VideoWithOwnerResponse {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
}

impl From<VideoWithOwner> for VideoWithOwnerResponse {
    fn from(video: VideoWithOwner) -> Self {
        Self {
            id: video.id,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            created_at: video.created_at,
            owner: UserSummary {
                id: video.owner_id,
                username: video.owner_username,
                display_name: video.owner_display_name,
                avatar_url: video.owner_avatar_url,
            },
        }
    }
}

/// Comment representation
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            video_id: comment.video_id,
            owner_id: comment.owner_id,
            created_at: comment.created_at,
        }
    }
}

/// Comment with its owner projection
#[derive(Debug, Serialize)]
pub struct CommentWithOwnerResponse {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
}

impl From<CommentWithOwner> for CommentWithOwnerResponse {
    fn from(comment: CommentWithOwner) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            video_id: comment.video_id,
            created_at: comment.created_at,
            owner: UserSummary {
                id: comment.owner_id,
                username: comment.owner_username,
                display_name: comment.owner_display_name,
                avatar_url: comment.owner_avatar_url,
            },
        }
    }
}

/// Tweet representation
#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tweet> for TweetResponse {
    fn from(tweet: Tweet) -> Self {
        Self {
            id: tweet.id,
            content: tweet.content,
            owner_id: tweet.owner_id,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
        }
    }
}

/// Playlist representation
#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Playlist> for PlaylistResponse {
    fn from(playlist: Playlist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            owner_id: playlist.owner_id,
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }
    }
}

/// Playlist with its videos in order
#[derive(Debug, Serialize)]
pub struct PlaylistDetailResponse {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    pub videos: Vec<VideoWithOwnerResponse>,
}

/// Like toggle outcome
#[derive(Debug, Serialize)]
pub struct LikeToggleResponse {
    pub target: &'static str,
    pub liked: bool,
}

/// Subscription toggle outcome
#[derive(Debug, Serialize)]
pub struct SubscriptionToggleResponse {
    pub channel_id: String,
    pub subscribed: bool,
}
