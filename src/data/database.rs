//! SQLite database operations
//!
//! All database access goes through this module. The document-store
//! aggregation pipelines of the API surface (filter/sort/paginate plus
//! owner projection joins) are composed here with sqlx's QueryBuilder
//! so handlers never see SQL.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::path::Path;

use super::models::*;
use crate::error::AppError;
use crate::metrics::DB_QUERIES_TOTAL;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Escape `%`, `_` and `\` in a user-supplied substring so it can be
/// embedded in a LIKE pattern with `ESCAPE '\'`.
fn escape_like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(limit)
}

const VIDEO_WITH_OWNER_COLUMNS: &str = "v.id, v.video_url, v.thumbnail_url, v.title, \
     v.description, v.duration, v.views, v.is_published, v.created_at, \
     u.id AS owner_id, u.username AS owner_username, \
     u.display_name AS owner_display_name, u.avatar_url AS owner_avatar_url";

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist and runs pending
    /// migrations automatically. Foreign keys are enabled on every
    /// connection; the cascade rules in the schema depend on it.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        DB_QUERIES_TOTAL.with_label_values(&["insert", "users"]).inc();
        sqlx::query(
            "INSERT INTO users (id, username, email, display_name, password_hash, \
             avatar_url, cover_image_url, refresh_token_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(&user.refresh_token_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up a user by username or email (either may be given).
    pub async fn get_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE (username = ?1 AND ?1 IS NOT NULL) \
             OR (email = ?2 AND ?2 IS NOT NULL)",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Replace (or clear) the stored refresh-token hash.
    pub async fn set_refresh_token_hash(
        &self,
        user_id: &str,
        token_hash: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token_hash = ?, updated_at = ? WHERE id = ?")
            .bind(token_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_user_details(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        sqlx::query(
            "UPDATE users SET display_name = COALESCE(?, display_name), \
             email = COALESCE(?, email), updated_at = ? WHERE id = ?",
        )
        .bind(display_name)
        .bind(email)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        self.get_user(user_id).await
    }

    /// Whether another user already holds this email.
    pub async fn email_taken_by_other(
        &self,
        email: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND id != ?)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken != 0)
    }

    /// Swap an image URL field and return the previous value so the
    /// caller can delete the replaced remote asset.
    pub async fn set_avatar_url(
        &self,
        user_id: &str,
        avatar_url: &str,
    ) -> Result<Option<String>, AppError> {
        let previous =
            sqlx::query_scalar::<_, String>("SELECT avatar_url FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        sqlx::query("UPDATE users SET avatar_url = ?, updated_at = ? WHERE id = ?")
            .bind(avatar_url)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(previous)
    }

    pub async fn set_cover_image_url(
        &self,
        user_id: &str,
        cover_image_url: &str,
    ) -> Result<Option<String>, AppError> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT cover_image_url FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();
        sqlx::query("UPDATE users SET cover_image_url = ?, updated_at = ? WHERE id = ?")
            .bind(cover_image_url)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(previous)
    }

    /// Channel profile with live subscription counts, from the viewer's
    /// perspective.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: &str,
    ) -> Result<Option<ChannelProfile>, AppError> {
        DB_QUERIES_TOTAL
            .with_label_values(&["select", "subscriptions"])
            .inc();
        let profile = sqlx::query_as::<_, ChannelProfile>(
            "SELECT u.id, u.username, u.display_name, u.avatar_url, u.cover_image_url, \
             (SELECT COUNT(*) FROM subscriptions WHERE channel_id = u.id) AS subscriber_count, \
             (SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = u.id) AS subscribed_to_count, \
             EXISTS(SELECT 1 FROM subscriptions WHERE channel_id = u.id AND subscriber_id = ?) \
                 AS is_subscribed \
             FROM users u WHERE u.username = ?",
        )
        .bind(viewer_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    // =========================================================================
    // Watch history
    // =========================================================================

    /// Record (or refresh) a watch-history entry; re-watching moves the
    /// video to the front.
    pub async fn record_watch(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO watch_history (user_id, video_id, watched_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, video_id) DO UPDATE SET watched_at = excluded.watched_at",
        )
        .bind(user_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Watched videos, most recent first, with owner projection.
    pub async fn watch_history(&self, user_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        let videos = sqlx::query_as::<_, VideoWithOwner>(&format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM watch_history h \
             JOIN videos v ON v.id = h.video_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE h.user_id = ? ORDER BY h.watched_at DESC",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        DB_QUERIES_TOTAL
            .with_label_values(&["insert", "videos"])
            .inc();
        sqlx::query(
            "INSERT INTO videos (id, owner_id, video_url, thumbnail_url, title, description, \
             duration, views, is_published, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&video.id)
        .bind(&video.owner_id)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    pub async fn get_video_with_owner(
        &self,
        id: &str,
    ) -> Result<Option<VideoWithOwner>, AppError> {
        let video = sqlx::query_as::<_, VideoWithOwner>(&format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM videos v \
             JOIN users u ON u.id = v.owner_id WHERE v.id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    pub async fn increment_video_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_video_metadata(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<Option<Video>, AppError> {
        sqlx::query(
            "UPDATE videos SET title = COALESCE(?, title), \
             description = COALESCE(?, description), \
             thumbnail_url = COALESCE(?, thumbnail_url), updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(thumbnail_url)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_video(id).await
    }

    pub async fn set_video_published(
        &self,
        id: &str,
        is_published: bool,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET is_published = ?, updated_at = ? WHERE id = ?")
            .bind(is_published)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete the video document. Comments, likes, playlist membership
    /// and watch-history rows go with it via FK cascade.
    pub async fn delete_video(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Composed public listing: published filter, optional title
    /// substring and owner filter, allow-listed sort, pagination, owner
    /// projection join. Returns the page plus the unpaginated total.
    pub async fn list_videos(
        &self,
        query: &VideoListQuery,
    ) -> Result<(Vec<VideoWithOwner>, i64), AppError> {
        DB_QUERIES_TOTAL
            .with_label_values(&["select", "videos"])
            .inc();

        let pattern = query
            .title_query
            .as_deref()
            .map(|q| format!("%{}%", escape_like_pattern(q)));

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM videos v \
             JOIN users u ON u.id = v.owner_id WHERE v.is_published = 1",
        ));
        if let Some(pattern) = &pattern {
            builder.push(" AND v.title LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\'");
        }
        if let Some(owner_id) = &query.owner_id {
            builder.push(" AND v.owner_id = ");
            builder.push_bind(owner_id.clone());
        }
        builder.push(format!(
            " ORDER BY {} {} LIMIT ",
            query.sort_by.column(),
            query.sort_direction.keyword()
        ));
        builder.push_bind(i64::from(query.limit));
        builder.push(" OFFSET ");
        builder.push_bind(page_offset(query.page, query.limit));

        let videos = builder
            .build_query_as::<VideoWithOwner>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM videos v WHERE v.is_published = 1");
        if let Some(pattern) = &pattern {
            count_builder.push(" AND v.title LIKE ");
            count_builder.push_bind(pattern.clone());
            count_builder.push(" ESCAPE '\\'");
        }
        if let Some(owner_id) = &query.owner_id {
            count_builder.push(" AND v.owner_id = ");
            count_builder.push_bind(owner_id.clone());
        }
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok((videos, total))
    }

    /// All of a channel's videos, including unpublished (owner dashboard
    /// view).
    pub async fn channel_videos(&self, owner_id: &str) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    /// Live channel statistics across the channel's published videos.
    pub async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, AppError> {
        DB_QUERIES_TOTAL
            .with_label_values(&["select", "videos"])
            .inc();
        let stats = sqlx::query_as::<_, ChannelStats>(
            "SELECT \
             (SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1) AS total_subscribers, \
             (SELECT COUNT(*) FROM videos WHERE owner_id = ?1 AND is_published = 1) \
                 AS total_videos, \
             (SELECT COALESCE(SUM(views), 0) FROM videos \
                 WHERE owner_id = ?1 AND is_published = 1) AS total_views, \
             (SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.video_id \
                 WHERE v.owner_id = ?1 AND v.is_published = 1) AS total_likes",
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO comments (id, content, owner_id, video_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.owner_id)
        .bind(&comment.video_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    pub async fn update_comment_content(
        &self,
        id: &str,
        content: &str,
    ) -> Result<Option<Comment>, AppError> {
        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.get_comment(id).await
    }

    pub async fn delete_comment(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Paginated comments for a video, newest first, with owner
    /// projection.
    pub async fn list_video_comments(
        &self,
        video_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CommentWithOwner>, i64), AppError> {
        let comments = sqlx::query_as::<_, CommentWithOwner>(
            "SELECT c.id, c.content, c.video_id, c.created_at, \
             u.id AS owner_id, u.username AS owner_username, \
             u.display_name AS owner_display_name, u.avatar_url AS owner_avatar_url \
             FROM comments c JOIN users u ON u.id = c.owner_id \
             WHERE c.video_id = ? ORDER BY c.created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(video_id)
        .bind(i64::from(limit))
        .bind(page_offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE video_id = ?")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((comments, total))
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    pub async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tweets (id, content, owner_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&tweet.id)
        .bind(&tweet.content)
        .bind(&tweet.owner_id)
        .bind(tweet.created_at)
        .bind(tweet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_tweet(&self, id: &str) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tweet)
    }

    pub async fn update_tweet_content(
        &self,
        id: &str,
        content: &str,
    ) -> Result<Option<Tweet>, AppError> {
        sqlx::query("UPDATE tweets SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.get_tweet(id).await
    }

    pub async fn delete_tweet(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Paginated tweets of one user, newest first.
    pub async fn list_user_tweets(
        &self,
        owner_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Tweet>, i64), AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE owner_id = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(owner_id)
        .bind(i64::from(limit))
        .bind(page_offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tweets WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((tweets, total))
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Atomic like toggle keyed by the unique (liker, target) index.
    ///
    /// Delete-if-matched first; only when nothing matched, insert. The
    /// insert uses OR IGNORE so a concurrent duplicate is absorbed by
    /// the unique index instead of creating a second row.
    ///
    /// Returns true when the toggle left the like present.
    pub async fn toggle_like(
        &self,
        liker_id: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<bool, AppError> {
        DB_QUERIES_TOTAL
            .with_label_values(&["toggle", "likes"])
            .inc();
        let column = target.column();

        let deleted = sqlx::query(&format!(
            "DELETE FROM likes WHERE liked_by = ? AND {column} = ?"
        ))
        .bind(liker_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted > 0 {
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT OR IGNORE INTO likes (id, liked_by, {column}, created_at) \
             VALUES (?, ?, ?, ?)"
        ))
        .bind(EntityId::new().0)
        .bind(liker_id)
        .bind(target_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Published videos the user liked, with owner projection.
    pub async fn liked_videos(&self, liker_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        let videos = sqlx::query_as::<_, VideoWithOwner>(&format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM likes l \
             JOIN videos v ON v.id = l.video_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE l.liked_by = ? AND v.is_published = 1 \
             ORDER BY l.created_at DESC",
        ))
        .bind(liker_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO playlists (id, name, description, owner_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.owner_id)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(playlist)
    }

    pub async fn playlist_name_exists(
        &self,
        owner_id: &str,
        name: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM playlists WHERE owner_id = ? AND name = ?)",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    pub async fn playlists_by_owner(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(playlists)
    }

    pub async fn update_playlist(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Playlist>, AppError> {
        sqlx::query(
            "UPDATE playlists SET name = COALESCE(?, name), \
             description = COALESCE(?, description), updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_playlist(id).await
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Append a video to a playlist. Re-adding an existing video is a
    /// no-op.
    pub async fn add_playlist_video(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position) \
             VALUES (?, ?, \
             (SELECT COALESCE(MAX(position) + 1, 0) FROM playlist_videos WHERE playlist_id = ?))",
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(playlist_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_playlist_video(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Videos of a playlist in insertion order, with owner projection.
    pub async fn playlist_videos(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<VideoWithOwner>, AppError> {
        let videos = sqlx::query_as::<_, VideoWithOwner>(&format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM playlist_videos pv \
             JOIN videos v ON v.id = pv.video_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE pv.playlist_id = ? ORDER BY pv.position ASC",
        ))
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Atomic subscription toggle on the unique (subscriber, channel)
    /// index; same shape as the like toggle.
    ///
    /// Returns true when the toggle left the subscription present.
    pub async fn toggle_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        DB_QUERIES_TOTAL
            .with_label_values(&["toggle", "subscriptions"])
            .inc();

        let deleted = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT OR IGNORE INTO subscriptions (id, subscriber_id, channel_id, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(EntityId::new().0)
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Users subscribed to a channel.
    pub async fn channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<UserSummary>, AppError> {
        let subscribers = sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.display_name, u.avatar_url \
             FROM subscriptions s JOIN users u ON u.id = s.subscriber_id \
             WHERE s.channel_id = ? ORDER BY s.created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscribers)
    }

    /// Channels a user subscribes to.
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<UserSummary>, AppError> {
        let channels = sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.display_name, u.avatar_url \
             FROM subscriptions s JOIN users u ON u.id = s.channel_id \
             WHERE s.subscriber_id = ? ORDER BY s.created_at DESC",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(channels)
    }
}
