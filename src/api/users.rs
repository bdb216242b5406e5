//! User and auth endpoints

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use super::{
    ApiBody, AuthResponse, MAX_IMAGE_UPLOAD_BYTES, SUPPORTED_IMAGE_TYPES, TokenResponse,
    UploadedFile, UserResponse, VideoWithOwnerResponse, ensure_supported_type, read_file_field,
    read_text_field,
};
use crate::AppState;
use crate::auth::{
    ACCESS_TOKEN_COOKIE, CurrentUser, REFRESH_TOKEN_COOKIE, refresh_token_from_cookies,
};
use crate::data::EntityId;
use crate::error::AppError;
use crate::service::{AccountService, RegistrationInput, TokenPair};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-tokens", post(refresh_tokens))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-details", patch(update_details))
        .route("/change-avatar", patch(change_avatar))
        .route("/change-cover-image", patch(change_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/watch-history", get(watch_history))
}

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone(), state.config.clone())
}

// =============================================================================
// Cookies
// =============================================================================

fn build_auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie
}

fn with_auth_cookies(jar: CookieJar, tokens: &TokenPair, state: &AppState) -> CookieJar {
    let secure = state.config.should_use_secure_cookies();
    jar.add(build_auth_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        secure,
    ))
    .add(build_auth_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        secure,
    ))
}

fn without_auth_cookies(jar: CookieJar) -> CookieJar {
    let mut access = Cookie::from(ACCESS_TOKEN_COOKIE);
    access.set_path("/");
    let mut refresh = Cookie::from(REFRESH_TOKEN_COOKIE);
    refresh.set_path("/");
    jar.remove(access).remove(refresh)
}

// =============================================================================
// Registration
// =============================================================================

#[derive(Default)]
struct RegisterForm {
    username: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    password: Option<String>,
    avatar: Option<UploadedFile>,
    cover_image: Option<UploadedFile>,
}

async fn parse_register_form(mut multipart: Multipart) -> Result<RegisterForm, AppError> {
    let mut form = RegisterForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "username" => form.username = Some(read_text_field(field).await?),
            "email" => form.email = Some(read_text_field(field).await?),
            "full_name" | "display_name" => {
                form.display_name = Some(read_text_field(field).await?)
            }
            "password" => form.password = Some(read_text_field(field).await?),
            "avatar" => {
                let file = read_file_field(field, MAX_IMAGE_UPLOAD_BYTES).await?;
                ensure_supported_type(&file.content_type, SUPPORTED_IMAGE_TYPES)?;
                form.avatar = Some(file);
            }
            "cover_image" => {
                let file = read_file_field(field, MAX_IMAGE_UPLOAD_BYTES).await?;
                ensure_supported_type(&file.content_type, SUPPORTED_IMAGE_TYPES)?;
                form.cover_image = Some(file);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/v1/users/register
async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiBody<UserResponse>>), AppError> {
    let form = parse_register_form(multipart).await?;

    let input = RegistrationInput::validate(
        form.username.as_deref().unwrap_or(""),
        form.email.as_deref().unwrap_or(""),
        form.display_name.as_deref().unwrap_or(""),
        form.password.as_deref().unwrap_or(""),
    )?;

    let avatar = form
        .avatar
        .ok_or_else(|| AppError::Validation("please upload an avatar image".to_string()))?;

    let service = account_service(&state);
    service
        .ensure_identity_available(&input.username, &input.email)
        .await?;

    // Stage, then commit. The staged copies are removed on drop no
    // matter which path this returns through.
    let staged_avatar = state.staging.stage(&avatar.bytes)?;
    let avatar_url = state
        .storage
        .upload_avatar(&EntityId::new().0, &staged_avatar, &avatar.content_type)
        .await?;

    let cover_image_url = match &form.cover_image {
        Some(cover) => {
            let staged_cover = state.staging.stage(&cover.bytes)?;
            Some(
                state
                    .storage
                    .upload_cover_image(&EntityId::new().0, &staged_cover, &cover.content_type)
                    .await?,
            )
        }
        None => None,
    };

    let user = service.create_user(input, avatar_url, cover_image_url).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiBody::ok("user created successfully", user.into())),
    ))
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: String,
}

/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiBody<AuthResponse>>), AppError> {
    let service = account_service(&state);
    let (user, tokens) = service
        .login(
            request.username.as_deref(),
            request.email.as_deref(),
            &request.password,
        )
        .await?;

    let jar = with_auth_cookies(jar, &tokens, &state);
    let body = AuthResponse {
        user: user.into(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };

    Ok((jar, Json(ApiBody::ok("logged in successfully", body))))
}

/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiBody<serde_json::Value>>), AppError> {
    account_service(&state).logout(&user.id).await?;

    Ok((
        without_auth_cookies(jar),
        Json(ApiBody::ok(
            "user logged out successfully",
            serde_json::json!({}),
        )),
    ))
}

#[derive(Debug, Default, Deserialize)]
struct RefreshRequest {
    refresh_token: Option<String>,
}

/// POST /api/v1/users/refresh-tokens
///
/// The refresh token arrives via cookie or, for clients without a
/// cookie jar, the request body.
async fn refresh_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<ApiBody<TokenResponse>>), AppError> {
    let incoming = refresh_token_from_cookies(&headers)
        .or_else(|| body.and_then(|Json(request)| request.refresh_token))
        .ok_or(AppError::Unauthorized)?;

    let service = account_service(&state);
    let (_user, tokens) = service.refresh_tokens(&incoming).await?;

    let jar = with_auth_cookies(jar, &tokens, &state);
    let body = TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };

    Ok((
        jar,
        Json(ApiBody::ok("access token refreshed successfully", body)),
    ))
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiBody<serde_json::Value>>, AppError> {
    account_service(&state)
        .change_password(&user.id, &request.old_password, &request.new_password)
        .await?;

    Ok(Json(ApiBody::ok(
        "password changed successfully",
        serde_json::json!({}),
    )))
}

/// GET /api/v1/users/current-user
async fn current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiBody<UserResponse>>, AppError> {
    let user = account_service(&state).current_user(&user.id).await?;
    Ok(Json(ApiBody::ok("current user fetched", user.into())))
}

#[derive(Debug, Deserialize)]
struct UpdateDetailsRequest {
    display_name: Option<String>,
    email: Option<String>,
}

/// PATCH /api/v1/users/update-details
async fn update_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateDetailsRequest>,
) -> Result<Json<ApiBody<UserResponse>>, AppError> {
    let updated = account_service(&state)
        .update_details(
            &user.id,
            request.display_name.as_deref(),
            request.email.as_deref(),
        )
        .await?;

    Ok(Json(ApiBody::ok(
        "account details updated successfully",
        updated.into(),
    )))
}

async fn parse_single_image(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("failed to parse multipart: {}", e)))?
    {
        if field.name() == Some(field_name) {
            let file = read_file_field(field, MAX_IMAGE_UPLOAD_BYTES).await?;
            ensure_supported_type(&file.content_type, SUPPORTED_IMAGE_TYPES)?;
            return Ok(file);
        }
    }
    Err(AppError::Validation(format!(
        "please upload a {} image",
        field_name
    )))
}

/// PATCH /api/v1/users/change-avatar
async fn change_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<ApiBody<UserResponse>>, AppError> {
    let file = parse_single_image(multipart, "avatar").await?;

    let staged = state.staging.stage(&file.bytes)?;
    let avatar_url = state
        .storage
        .upload_avatar(&EntityId::new().0, &staged, &file.content_type)
        .await?;

    let (updated, previous) = account_service(&state)
        .change_avatar(&user.id, &avatar_url)
        .await?;
    if let Some(previous) = previous {
        state.storage.delete_by_url(&previous).await;
    }

    Ok(Json(ApiBody::ok(
        "avatar updated successfully",
        updated.into(),
    )))
}

/// PATCH /api/v1/users/change-cover-image
async fn change_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<ApiBody<UserResponse>>, AppError> {
    let file = parse_single_image(multipart, "cover_image").await?;

    let staged = state.staging.stage(&file.bytes)?;
    let cover_url = state
        .storage
        .upload_cover_image(&EntityId::new().0, &staged, &file.content_type)
        .await?;

    let (updated, previous) = account_service(&state)
        .change_cover_image(&user.id, &cover_url)
        .await?;
    if let Some(previous) = previous {
        state.storage.delete_by_url(&previous).await;
    }

    Ok(Json(ApiBody::ok(
        "cover image updated successfully",
        updated.into(),
    )))
}

// =============================================================================
// Channel profile / watch history
// =============================================================================

/// GET /api/v1/users/c/:username
async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ApiBody<crate::data::ChannelProfile>>, AppError> {
    let profile = account_service(&state)
        .channel_profile(&username, &user.id)
        .await?;

    Ok(Json(ApiBody::ok(
        "channel profile fetched successfully",
        profile,
    )))
}

/// GET /api/v1/users/watch-history
async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiBody<Vec<VideoWithOwnerResponse>>>, AppError> {
    let videos = account_service(&state).watch_history(&user.id).await?;

    Ok(Json(ApiBody::ok(
        "watch history fetched successfully",
        videos.into_iter().map(Into::into).collect(),
    )))
}
