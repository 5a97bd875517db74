use axum::{
    Extension, Json,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, ApiResponse, AppState, AuthResponse, CurrentUserResponse, ProfileDto,
    ProfilePictureResponse, validation,
};
use crate::entities::users;
use crate::services::AdminAction;
use crate::services::accounts::RegisterInput;

const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub memorable_information: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProfilePictureRequest {
    pub profile_picture: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// The authenticated caller, inserted into request extensions by
/// `auth_middleware`.
#[derive(Clone)]
pub struct AuthUser(pub users::Model);

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `Authorization: Bearer <access credential>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Check session first (fastest path for web UI)
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await
        && let Ok(Some(user)) = state.store().users().get_by_id(user_id).await
        && user.is_active
    {
        request.extensions_mut().insert(AuthUser(user));
        return Ok(next.run(request).await);
    }

    if let Some(token) = bearer_token(&headers)
        && let Ok(user_id) = state.shared.credentials.verify_access(&token)
        && let Ok(Some(user)) = state.store().users().get_by_id(user_id).await
        && user.is_active
    {
        request.extensions_mut().insert(AuthUser(user));
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// Best-effort client address for audit rows: first `X-Forwarded-For`
/// entry, then the socket address, then "unknown".
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(forwarded) = parts.headers.get("x-forwarded-for")
            && let Ok(value) = forwarded.to_str()
            && let Some(first) = value.split(',').next()
        {
            let first = first.trim();
            if !first.is_empty() {
                return Ok(Self(first.to_string()));
            }
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string());

        Ok(Self(ip))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Self-service registration; responds with the new user and a credential pair
pub async fn register(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let username = validation::validate_username(&payload.username)?.to_string();
    let email = validation::validate_email(&payload.email)?.to_string();
    validation::validate_password(&payload.password)?;
    validation::validate_person_name("First name", &payload.first_name)?;
    validation::validate_person_name("Last name", &payload.last_name)?;

    let user = state
        .shared
        .accounts
        .register(
            RegisterInput {
                username,
                email,
                password: payload.password,
                first_name: payload.first_name,
                last_name: payload.last_name,
                memorable_information: payload.memorable_information,
            },
            &ip,
        )
        .await?;

    let tokens = state.shared.credentials.issue_pair(user.id)?;

    tracing::info!("User '{}' registered", user.username);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse {
            user: user.into(),
            access: tokens.access,
            refresh: tokens.refresh,
        })),
    ))
}

/// POST /auth/login
/// Authenticate with username and password; creates a session and returns
/// a fresh credential pair
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store()
        .users()
        .verify_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .users()
        .get_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if let Err(e) = session.insert(SESSION_USER_KEY, user.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    if user.is_superuser {
        state
            .shared
            .audit
            .record_admin_action(
                Some(user.id),
                AdminAction::Login,
                None,
                &format!("Admin '{}' logged in", user.username),
                &ip,
            )
            .await;
    }

    let tokens = state.shared.credentials.issue_pair(user.id)?;

    Ok(Json(ApiResponse::success(AuthResponse {
        user: user.into(),
        access: tokens.access,
        refresh: tokens.refresh,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<CurrentUserResponse>>, ApiError> {
    let profile = state.shared.accounts.get_profile(user.id).await?;

    Ok(Json(ApiResponse::success(CurrentUserResponse {
        user: user.into(),
        profile: profile.map(ProfileDto::from),
    })))
}

/// POST /auth/profile/picture
/// Set or replace the caller's own profile picture
pub async fn update_profile_picture(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(payload): Json<ProfilePictureRequest>,
) -> Result<Json<ApiResponse<ProfilePictureResponse>>, ApiError> {
    let url = validation::validate_picture_url(&payload.profile_picture)?.to_string();

    state
        .shared
        .accounts
        .update_profile_picture(user.id, &url)
        .await?;

    Ok(Json(ApiResponse::success(ProfilePictureResponse {
        message: "Profile picture updated successfully.".to_string(),
        profile_picture: url,
    })))
}
