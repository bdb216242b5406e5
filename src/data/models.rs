//! Data models
//!
//! Rust structs representing database entities and the projections the
//! list queries return. All models use ULID for IDs and chrono for
//! timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user / channel
///
/// Holds the password and refresh-token hashes; deliberately not
/// serializable so credentials can never leak through a response body.
/// Outward representations go through `api::dto::UserResponse`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Normalized lowercase, globally unique
    pub username: String,
    /// Normalized lowercase, globally unique
    pub email: String,
    pub display_name: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Object-store URL
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    /// SHA-256 of the single active refresh token, null when logged out
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal user projection joined onto owned entities
/// (username, display name, avatar)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// Channel profile view: user projection plus live subscription counts
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

// =============================================================================
// Video
// =============================================================================

/// An uploaded video
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Video {
    pub id: String,
    pub owner_id: String,
    /// Object-store URL of the media file
    pub video_url: String,
    /// Object-store URL of the thumbnail image
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video row enriched with its owner projection, as returned by the
/// composed list query
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoWithOwner {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar_url: String,
}

/// Sort keys allowed on video listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSortField {
    CreatedAt,
    Duration,
    Views,
}

impl VideoSortField {
    /// Parse a caller-supplied sort key against the allow-list.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "duration" => Some(Self::Duration),
            "views" => Some(Self::Views),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Duration => "v.duration",
            Self::Views => "v.views",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Filter/sort/paginate specification for the video listing
#[derive(Debug, Clone)]
pub struct VideoListQuery {
    /// Case-insensitive substring match on title
    pub title_query: Option<String>,
    /// Restrict to one channel's videos
    pub owner_id: Option<String>,
    pub sort_by: VideoSortField,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub limit: u32,
}

impl Default for VideoListQuery {
    fn default() -> Self {
        Self {
            title_query: None,
            owner_id: None,
            sort_by: VideoSortField::CreatedAt,
            sort_direction: SortDirection::Descending,
            page: 1,
            limit: 10,
        }
    }
}

// =============================================================================
// Comment / Tweet
// =============================================================================

/// A comment on a video
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with owner projection
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithOwner {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar_url: String,
}

/// A short text post
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tweet {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Like
// =============================================================================

/// Which entity a like points at
///
/// Exactly one target per like row; the schema enforces this with a
/// CHECK constraint and a unique index per (liker, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    pub fn column(self) -> &'static str {
        match self {
            Self::Video => "video_id",
            Self::Comment => "comment_id",
            Self::Tweet => "tweet_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
        }
    }
}

// =============================================================================
// Playlist
// =============================================================================

/// A named, ordered collection of videos
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Subscription
// =============================================================================

/// Subscriber → channel edge
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Live channel statistics, always computed from the base tables
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChannelStats {
    pub total_subscribers: i64,
    pub total_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
}
