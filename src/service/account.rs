//! Account service
//!
//! Registration, login, token refresh, password and profile management,
//! channel profiles and watch history.

use std::sync::Arc;

use crate::auth::{hash_password, jwt, verify_password};
use crate::config::AppConfig;
use crate::data::{ChannelProfile, Database, EntityId, User, VideoWithOwner};
use crate::error::AppError;

/// Freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
}

impl RegistrationInput {
    /// Validate and normalize raw registration fields.
    ///
    /// Username and email are lowered; the password must satisfy the
    /// composition rules before anything is persisted or uploaded.
    pub fn validate(
        username: &str,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Self, AppError> {
        let username = username.trim().to_lowercase();
        let email = email.trim().to_lowercase();
        let display_name = display_name.trim().to_string();

        if display_name.is_empty() {
            return Err(AppError::Validation("display_name field is empty".to_string()));
        }
        if username.is_empty() {
            return Err(AppError::Validation("username field is empty".to_string()));
        }
        if email.is_empty() {
            return Err(AppError::Validation("email field is empty".to_string()));
        }
        validate_password(password)?;
        validate_email(&email)?;

        Ok(Self {
            username,
            email,
            display_name,
            password: password.to_string(),
        })
    }
}

/// Password composition rules: at least 8 characters, containing '@',
/// '#', and a digit.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("password field is empty".to_string()));
    }
    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "password should have at least 8 characters".to_string(),
        ));
    }
    if !(password.contains('@') && password.contains('#')) {
        return Err(AppError::Validation(
            "password should include '@' and '#'".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "password should include a number as well".to_string(),
        ));
    }
    Ok(())
}

/// Minimal well-formedness check: local@domain.tld, no whitespace.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation("invalid email".to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || email.chars().any(char::is_whitespace)
        || email.matches('@').count() != 1
    {
        return Err(invalid());
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }
    Ok(())
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Fail with `Conflict` when the username or email is already
    /// registered. Called before any media is committed so a duplicate
    /// registration never uploads.
    pub async fn ensure_identity_available(
        &self,
        username: &str,
        email: &str,
    ) -> Result<(), AppError> {
        if self
            .db
            .get_user_by_login(Some(username), Some(email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "user already exists, please try a different username or email".to_string(),
            ));
        }
        Ok(())
    }

    /// Persist a validated registration. The avatar/cover URLs point at
    /// already-committed object-store assets.
    pub async fn create_user(
        &self,
        input: RegistrationInput,
        avatar_url: String,
        cover_image_url: Option<String>,
    ) -> Result<User, AppError> {
        let now = chrono::Utc::now();
        let user = User {
            id: EntityId::new().0,
            username: input.username,
            email: input.email,
            display_name: input.display_name,
            password_hash: hash_password(&input.password)?,
            avatar_url,
            cover_image_url,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_user(&user).await?;
        crate::metrics::USERS_REGISTERED_TOTAL.inc();

        tracing::info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Issue a fresh token pair and persist the refresh-token hash,
    /// replacing any prior session.
    async fn issue_session(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token = jwt::issue_access_token(user, &self.config.auth)?;
        let refresh_token = jwt::issue_refresh_token(&user.id, &self.config.auth)?;

        self.db
            .set_refresh_token_hash(&user.id, Some(&jwt::hash_refresh_token(&refresh_token)))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Username-or-email + password login.
    pub async fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<(User, TokenPair), AppError> {
        if username.is_none() && email.is_none() {
            return Err(AppError::Validation(
                "username or email is required".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AppError::Validation("please enter a password".to_string()));
        }

        let username = username.map(|u| u.trim().to_lowercase());
        let email = email.map(|e| e.trim().to_lowercase());
        let user = self
            .db
            .get_user_by_login(username.as_deref(), email.as_deref())
            .await?
            .ok_or(AppError::NotFound)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_session(&user).await?;
        tracing::info!(username = %user.username, "user logged in");
        Ok((user, tokens))
    }

    /// Invalidate the active refresh token.
    pub async fn logout(&self, user_id: &str) -> Result<(), AppError> {
        self.db.set_refresh_token_hash(user_id, None).await
    }

    /// Rotate the token pair from an incoming refresh token.
    ///
    /// The stored hash must match the incoming token (single-session
    /// model); a superseded or logged-out token is rejected.
    pub async fn refresh_tokens(
        &self,
        incoming_token: &str,
    ) -> Result<(User, TokenPair), AppError> {
        let claims =
            jwt::verify_refresh_token(incoming_token, &self.config.auth.refresh_token_secret)?;

        let user = self
            .db
            .get_user(&claims.sub)
            .await?
            .ok_or(AppError::NotFound)?;

        let stored_hash = user
            .refresh_token_hash
            .as_deref()
            .ok_or(AppError::Unauthorized)?;
        if stored_hash != jwt::hash_refresh_token(incoming_token) {
            tracing::warn!(username = %user.username, "refresh token mismatch; rejecting");
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_session(&user).await?;
        Ok((user, tokens))
    }

    /// Change the password, verifying the old one first.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }
        validate_password(new_password)?;

        self.db
            .set_password_hash(user_id, &hash_password(new_password)?)
            .await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: &str) -> Result<User, AppError> {
        self.db.get_user(user_id).await?.ok_or(AppError::NotFound)
    }

    /// Update display name and/or email.
    pub async fn update_details(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        let display_name = match display_name.map(str::trim) {
            Some("") => {
                return Err(AppError::Validation(
                    "display_name field is empty".to_string(),
                ));
            }
            other => other,
        };

        let email = match email {
            Some(raw) => {
                let normalized = raw.trim().to_lowercase();
                validate_email(&normalized)?;
                if self.db.email_taken_by_other(&normalized, user_id).await? {
                    return Err(AppError::Conflict("email is already in use".to_string()));
                }
                Some(normalized)
            }
            None => None,
        };

        self.db
            .update_user_details(user_id, display_name, email.as_deref())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Swap the avatar URL, returning the updated user and the replaced
    /// remote URL for best-effort deletion.
    pub async fn change_avatar(
        &self,
        user_id: &str,
        avatar_url: &str,
    ) -> Result<(User, Option<String>), AppError> {
        let previous = self.db.set_avatar_url(user_id, avatar_url).await?;
        let user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        Ok((user, previous))
    }

    /// Swap the cover-image URL, returning the replaced remote URL.
    pub async fn change_cover_image(
        &self,
        user_id: &str,
        cover_image_url: &str,
    ) -> Result<(User, Option<String>), AppError> {
        let previous = self.db.set_cover_image_url(user_id, cover_image_url).await?;
        let user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        Ok((user, previous))
    }

    /// Channel profile as seen by the viewer.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: &str,
    ) -> Result<ChannelProfile, AppError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::Validation("please enter a username".to_string()));
        }
        self.db
            .channel_profile(&username, viewer_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Watched videos, most recent first.
    pub async fn watch_history(&self, user_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        self.db.watch_history(user_id).await
    }
}
