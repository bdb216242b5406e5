//! Authentication middleware
//!
//! The auth gate: extracts a bearer token from the `access_token`
//! cookie or the Authorization header, validates it against the token
//! service, and hands the resolved identity to handlers as an explicit
//! extractor value.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::jwt::verify_access_token;
use crate::AppState;
use crate::error::AppError;

/// Cookie name carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie name carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Identity resolved by the auth gate
///
/// Built from verified access-token claims; passed explicitly into
/// controller logic instead of living in ambient request state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
}

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

/// Extractor for the current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = verify_access_token(&token, &state.config.auth.access_token_secret)?;

        let user = AuthUser {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            display_name: claims.display_name,
        };
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

/// Pull a refresh token out of the cookie jar, if present.
pub fn refresh_token_from_cookies(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}
