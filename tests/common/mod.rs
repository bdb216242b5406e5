//! Common test utilities for E2E tests

use chrono::Utc;
use cliptide::data::{EntityId, User, Video};
use cliptide::{AppState, auth, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database and staging
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let staging_dir = temp_dir.path().join("staging");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
                cors_origin: None,
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                media: config::MediaStorageConfig {
                    bucket: "test-media".to_string(),
                    public_url: "https://media.test.example.com".to_string(),
                },
                staging_dir,
            },
            object_store: config::ObjectStoreConfig {
                account_id: "test-account".to_string(),
                access_key_id: "test-key".to_string(),
                secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                access_token_secret: "test-access-secret-32-bytes-long".to_string(),
                refresh_token_secret: "test-refresh-secret-32-bytes-ok!".to_string(),
                access_token_ttl: 900,
                refresh_token_ttl: 864_000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = cliptide::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Seed a user directly in the database with the given password.
    pub async fn create_user(&self, username: &str, password: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            display_name: username.to_string(),
            password_hash: auth::hash_password(password).unwrap(),
            avatar_url: format!("https://media.test.example.com/avatars/{}.webp", username),
            cover_image_url: None,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_user(&user).await.unwrap();
        user
    }

    /// Issue a valid access token for a seeded user.
    pub fn token_for(&self, user: &User) -> String {
        auth::jwt::issue_access_token(user, &self.state.config.auth).unwrap()
    }

    /// Seed a published video owned by the given user.
    pub async fn create_video(&self, owner: &User, title: &str) -> Video {
        let now = Utc::now();
        let video = Video {
            id: EntityId::new().0,
            owner_id: owner.id.clone(),
            video_url: format!("https://media.test.example.com/videos/{}.mp4", title),
            thumbnail_url: format!(
                "https://media.test.example.com/thumbnails/{}.webp",
                title
            ),
            title: title.to_string(),
            description: String::new(),
            duration: 42.0,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_video(&video).await.unwrap();
        video
    }
}
