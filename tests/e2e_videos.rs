//! E2E tests for video listing, retrieval, updates, and ownership

mod common;

use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_video_listing_requires_auth() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/v1/videos/"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_sort_field_outside_allow_list_is_rejected() {
    let server = TestServer::new().await;
    let user = server.create_user("alice", "Secret1@#").await;
    let token = server.token_for(&user);

    let response = server
        .client
        .get(server.url("/api/v1/videos/?sort_by=password_hash"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("sort_by"));
}

#[tokio::test]
async fn test_listing_filters_sorts_and_paginates() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice", "Secret1@#").await;
    let token = server.token_for(&alice);

    server.create_video(&alice, "Rust basics").await;
    server.create_video(&alice, "Rust advanced").await;
    server.create_video(&alice, "Gardening").await;

    // Case-insensitive substring filter
    let response = server
        .client
        .get(server.url("/api/v1/videos/?query=RUST"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["total"], 2);

    // Pagination caps page size
    let response = server
        .client
        .get(server.url("/api/v1/videos/?page=1&limit=2"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["total_pages"], 2);

    // Owner projection present
    assert_eq!(json["data"]["items"][0]["owner"]["username"], "alice");
}

#[tokio::test]
async fn test_listing_with_unknown_channel_is_not_found() {
    let server = TestServer::new().await;
    let user = server.create_user("alice", "Secret1@#").await;
    let token = server.token_for(&user);

    let response = server
        .client
        .get(server.url("/api/v1/videos/?user_id=01NOSUCHUSER0000000000000"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_get_video_counts_view_and_records_history() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice", "Secret1@#").await;
    let bob = server.create_user("bob", "Secret1@#").await;
    let bob_token = server.token_for(&bob);
    let video = server.create_video(&alice, "Rust basics").await;

    let response = server
        .client
        .get(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header("Authorization", format!("Bearer {}", bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["views"], 1);

    let response = server
        .client
        .get(server.url("/api/v1/users/watch-history"))
        .header("Authorization", format!("Bearer {}", bob_token))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], video.id.as_str());
}

#[tokio::test]
async fn test_get_unknown_video_is_not_found() {
    let server = TestServer::new().await;
    let user = server.create_user("alice", "Secret1@#").await;
    let token = server.token_for(&user);

    let response = server
        .client
        .get(server.url("/api/v1/videos/01NOSUCHVIDEO000000000000"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_metadata_update_is_owner_only() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice", "Secret1@#").await;
    let bob = server.create_user("bob", "Secret1@#").await;
    let video = server.create_video(&alice, "Original title").await;

    let form = reqwest::multipart::Form::new().text("title", "Hijacked");
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header("Authorization", format!("Bearer {}", server.token_for(&bob)))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Entity unmodified
    let stored = server.state.db.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original title");

    // Owner can update
    let form = reqwest::multipart::Form::new().text("title", "Renamed");
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header(
            "Authorization",
            format!("Bearer {}", server.token_for(&alice)),
        )
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["title"], "Renamed");
}

#[tokio::test]
async fn test_delete_is_owner_only_and_leaves_video_intact() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice", "Secret1@#").await;
    let bob = server.create_user("bob", "Secret1@#").await;
    let video = server.create_video(&alice, "Keep me").await;

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header("Authorization", format!("Bearer {}", server.token_for(&bob)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    assert!(server.state.db.get_video(&video.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_toggle_publish_hides_video_from_others() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice", "Secret1@#").await;
    let bob = server.create_user("bob", "Secret1@#").await;
    let video = server.create_video(&alice, "Now you see me").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/toggle/publish/{}", video.id)))
        .header(
            "Authorization",
            format!("Bearer {}", server.token_for(&alice)),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["is_published"], false);

    // Hidden from another viewer
    let response = server
        .client
        .get(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header("Authorization", format!("Bearer {}", server.token_for(&bob)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Still visible to the owner
    let response = server
        .client
        .get(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header(
            "Authorization",
            format!("Bearer {}", server.token_for(&alice)),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Non-owner cannot flip the flag
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/toggle/publish/{}", video.id)))
        .header("Authorization", format!("Bearer {}", server.token_for(&bob)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_publish_without_thumbnail_is_rejected() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice", "Secret1@#").await;

    let video_part = reqwest::multipart::Part::bytes(vec![0u8; 128])
        .file_name("clip.mp4")
        .mime_str("video/mp4")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("title", "No thumbnail")
        .part("video", video_part);

    let response = server
        .client
        .post(server.url("/api/v1/videos/publish"))
        .header(
            "Authorization",
            format!("Bearer {}", server.token_for(&alice)),
        )
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);

    // No document was created
    let videos = server.state.db.channel_videos(&alice.id).await.unwrap();
    assert!(videos.is_empty());
}
