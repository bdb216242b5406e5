//! Database tests

use super::*;
use chrono::Utc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        display_name: username.to_string(),
        password_hash: "$argon2id$test-hash".to_string(),
        avatar_url: format!("https://media.example.com/avatars/{}.webp", username),
        cover_image_url: None,
        refresh_token_hash: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_video(owner: &User, title: &str, duration: f64, views: i64) -> Video {
    let now = Utc::now();
    Video {
        id: EntityId::new().0,
        owner_id: owner.id.clone(),
        video_url: format!("https://media.example.com/videos/{}.mp4", title),
        thumbnail_url: format!("https://media.example.com/thumbnails/{}.webp", title),
        title: title.to_string(),
        description: String::new(),
        duration,
        views,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_insert_and_lookup() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alice");
    db.insert_user(&user).await.unwrap();

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");

    let by_username = db
        .get_user_by_login(Some("alice"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_username.id, user.id);

    let by_email = db
        .get_user_by_login(None, Some("alice@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(db.get_user_by_login(Some("bob"), None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("alice")).await.unwrap();

    let mut duplicate = test_user("alice");
    duplicate.email = "other@example.com".to_string();
    let result = db.insert_user(&duplicate).await;
    assert!(result.is_err(), "unique username constraint must hold");
}

#[tokio::test]
async fn test_refresh_token_hash_round_trip() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alice");
    db.insert_user(&user).await.unwrap();

    db.set_refresh_token_hash(&user.id, Some("sha256:abc"))
        .await
        .unwrap();
    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token_hash.as_deref(), Some("sha256:abc"));

    db.set_refresh_token_hash(&user.id, None).await.unwrap();
    let cleared = db.get_user(&user.id).await.unwrap().unwrap();
    assert!(cleared.refresh_token_hash.is_none());
}

#[tokio::test]
async fn test_video_list_filters_sorts_and_paginates() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("alice");
    db.insert_user(&owner).await.unwrap();

    for (title, duration, views) in [
        ("Rust tutorial part one", 60.0, 5),
        ("Rust tutorial part two", 120.0, 50),
        ("Cooking with gas", 30.0, 500),
    ] {
        db.insert_video(&test_video(&owner, title, duration, views))
            .await
            .unwrap();
    }
    let mut unpublished = test_video(&owner, "Secret draft", 10.0, 0);
    unpublished.is_published = false;
    db.insert_video(&unpublished).await.unwrap();

    // Published filter and case-insensitive substring match
    let (videos, total) = db
        .list_videos(&VideoListQuery {
            title_query: Some("rust TUTORIAL".to_string()),
            ..VideoListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(videos.len(), 2);
    assert!(videos.iter().all(|v| v.title.contains("Rust tutorial")));

    // Sort by views ascending
    let (videos, _) = db
        .list_videos(&VideoListQuery {
            sort_by: VideoSortField::Views,
            sort_direction: SortDirection::Ascending,
            ..VideoListQuery::default()
        })
        .await
        .unwrap();
    let views: Vec<i64> = videos.iter().map(|v| v.views).collect();
    assert_eq!(views, vec![5, 50, 500]);

    // Pagination: pages of one concatenate to the full ordering
    let mut collected = Vec::new();
    for page in 1..=3 {
        let (chunk, total) = db
            .list_videos(&VideoListQuery {
                sort_by: VideoSortField::Views,
                sort_direction: SortDirection::Ascending,
                page,
                limit: 1,
                ..VideoListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(chunk.len(), 1);
        collected.push(chunk[0].views);
    }
    assert_eq!(collected, views);

    // Owner projection joined
    let (videos, _) = db.list_videos(&VideoListQuery::default()).await.unwrap();
    assert!(videos.iter().all(|v| v.owner_username == "alice"));
}

#[tokio::test]
async fn test_like_toggle_is_idempotent_pairwise() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("alice");
    let liker = test_user("bob");
    db.insert_user(&owner).await.unwrap();
    db.insert_user(&liker).await.unwrap();
    let video = test_video(&owner, "Video", 10.0, 0);
    db.insert_video(&video).await.unwrap();

    let liked = db
        .toggle_like(&liker.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    assert!(liked);
    assert_eq!(db.liked_videos(&liker.id).await.unwrap().len(), 1);

    let liked = db
        .toggle_like(&liker.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    assert!(!liked, "second toggle returns to the original state");
    assert!(db.liked_videos(&liker.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_toggle_round_trip() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("alice");
    let subscriber = test_user("bob");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&subscriber).await.unwrap();

    assert!(db
        .toggle_subscription(&subscriber.id, &channel.id)
        .await
        .unwrap());
    assert_eq!(db.channel_subscribers(&channel.id).await.unwrap().len(), 1);
    assert_eq!(
        db.subscribed_channels(&subscriber.id).await.unwrap().len(),
        1
    );

    assert!(!db
        .toggle_subscription(&subscriber.id, &channel.id)
        .await
        .unwrap());
    assert!(db.channel_subscribers(&channel.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_channel_stats_count_published_only() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("alice");
    let fan = test_user("bob");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&fan).await.unwrap();

    let published = test_video(&channel, "Published", 10.0, 40);
    db.insert_video(&published).await.unwrap();
    let mut draft = test_video(&channel, "Draft", 10.0, 9000);
    draft.is_published = false;
    db.insert_video(&draft).await.unwrap();

    db.toggle_subscription(&fan.id, &channel.id).await.unwrap();
    db.toggle_like(&fan.id, LikeTarget::Video, &published.id)
        .await
        .unwrap();
    db.toggle_like(&fan.id, LikeTarget::Video, &draft.id)
        .await
        .unwrap();

    let stats = db.channel_stats(&channel.id).await.unwrap();
    assert_eq!(stats.total_subscribers, 1);
    assert_eq!(stats.total_videos, 1);
    assert_eq!(stats.total_views, 40);
    assert_eq!(stats.total_likes, 1, "draft likes are not counted");
}

#[tokio::test]
async fn test_video_delete_cascades_to_dependents() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("alice");
    let fan = test_user("bob");
    db.insert_user(&owner).await.unwrap();
    db.insert_user(&fan).await.unwrap();

    let video = test_video(&owner, "Video", 10.0, 0);
    db.insert_video(&video).await.unwrap();

    let now = Utc::now();
    let comment = Comment {
        id: EntityId::new().0,
        content: "nice".to_string(),
        owner_id: fan.id.clone(),
        video_id: video.id.clone(),
        created_at: now,
        updated_at: now,
    };
    db.insert_comment(&comment).await.unwrap();
    db.toggle_like(&fan.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    db.record_watch(&fan.id, &video.id).await.unwrap();

    assert_eq!(db.delete_video(&video.id).await.unwrap(), 1);

    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert!(db.liked_videos(&fan.id).await.unwrap().is_empty());
    assert!(db.watch_history(&fan.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_watch_history_is_most_recent_first() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("alice");
    let viewer = test_user("bob");
    db.insert_user(&owner).await.unwrap();
    db.insert_user(&viewer).await.unwrap();

    let first = test_video(&owner, "First", 10.0, 0);
    let second = test_video(&owner, "Second", 10.0, 0);
    db.insert_video(&first).await.unwrap();
    db.insert_video(&second).await.unwrap();

    db.record_watch(&viewer.id, &first.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    db.record_watch(&viewer.id, &second.id).await.unwrap();

    let history = db.watch_history(&viewer.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);

    // Re-watching moves the video back to the front
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    db.record_watch(&viewer.id, &first.id).await.unwrap();
    let history = db.watch_history(&viewer.id).await.unwrap();
    assert_eq!(history.len(), 2, "re-watch does not duplicate the entry");
    assert_eq!(history[0].id, first.id);
}

#[tokio::test]
async fn test_playlist_membership_is_ordered_and_deduplicated() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("alice");
    db.insert_user(&owner).await.unwrap();

    let now = Utc::now();
    let playlist = Playlist {
        id: EntityId::new().0,
        name: "Favourites".to_string(),
        description: String::new(),
        owner_id: owner.id.clone(),
        created_at: now,
        updated_at: now,
    };
    db.insert_playlist(&playlist).await.unwrap();

    assert!(db
        .playlist_name_exists(&owner.id, "Favourites")
        .await
        .unwrap());

    let first = test_video(&owner, "First", 10.0, 0);
    let second = test_video(&owner, "Second", 10.0, 0);
    db.insert_video(&first).await.unwrap();
    db.insert_video(&second).await.unwrap();

    db.add_playlist_video(&playlist.id, &first.id).await.unwrap();
    db.add_playlist_video(&playlist.id, &second.id)
        .await
        .unwrap();
    // duplicate add is absorbed
    db.add_playlist_video(&playlist.id, &first.id).await.unwrap();

    let videos = db.playlist_videos(&playlist.id).await.unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, first.id);
    assert_eq!(videos[1].id, second.id);

    assert_eq!(
        db.remove_playlist_video(&playlist.id, &first.id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(db.playlist_videos(&playlist.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_channel_profile_counts_and_flag() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("alice");
    let viewer = test_user("bob");
    let other = test_user("carol");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&viewer).await.unwrap();
    db.insert_user(&other).await.unwrap();

    db.toggle_subscription(&viewer.id, &channel.id).await.unwrap();
    db.toggle_subscription(&other.id, &channel.id).await.unwrap();
    db.toggle_subscription(&channel.id, &other.id).await.unwrap();

    let profile = db
        .channel_profile("alice", &viewer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.subscriber_count, 2);
    assert_eq!(profile.subscribed_to_count, 1);
    assert!(profile.is_subscribed);

    let profile = db
        .channel_profile("alice", &other.id)
        .await
        .unwrap()
        .unwrap();
    assert!(profile.is_subscribed);

    let profile = db
        .channel_profile("carol", &viewer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!profile.is_subscribed);
}
