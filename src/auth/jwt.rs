//! JWT token service
//!
//! Issues and validates the access/refresh token pair. Access tokens
//! carry the resolved identity; refresh tokens carry only the user id.
//! The refresh token is never stored verbatim: the user row keeps a
//! SHA-256 digest, and the refresh flow compares digests.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::data::User;
use crate::error::AppError;

const REFRESH_TOKEN_HASH_PREFIX: &str = "sha256:";

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued-at timestamp
    pub iat: i64,
}

/// Claims carried by a refresh token (user id only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issue a short-lived access token for a user.
pub fn issue_access_token(user: &User, auth: &AuthConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        exp: (now + Duration::seconds(auth.access_token_ttl)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.access_token_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign access token: {}", e)))
}

/// Issue a longer-lived refresh token.
///
/// The caller is responsible for persisting `hash_refresh_token` of the
/// returned value onto the user record, replacing any prior value.
pub fn issue_refresh_token(user_id: &str, auth: &AuthConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::seconds(auth.refresh_token_ttl)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.refresh_token_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign refresh token: {}", e)))
}

/// Verify an access token's signature and expiry.
pub fn verify_access_token(token: &str, secret: &str) -> Result<AccessClaims, AppError> {
    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("access token verification failed: {}", e);
        AppError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Verify a refresh token's signature and expiry.
pub fn verify_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, AppError> {
    let token_data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("refresh token verification failed: {}", e);
        AppError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Digest a refresh token for at-rest storage.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!(
        "{}{}",
        REFRESH_TOKEN_HASH_PREFIX,
        URL_SAFE_NO_PAD.encode(digest)
    )
}
