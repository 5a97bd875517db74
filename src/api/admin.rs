use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AuthUser, ClientIp};
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto, validation};
use crate::entities::{account_histories, admin_activity_logs};
use crate::services::accounts::{CreateAccountInput, require_superuser};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_can_revoke")]
    pub can_revoke_admins: bool,
    #[serde(default)]
    pub memorable_information: String,
}

const fn default_can_revoke() -> bool {
    true
}

/// `limit` arrives as a raw string so garbage values degrade to the
/// default instead of failing deserialization.
#[derive(Deserialize)]
pub struct ActivityQuery {
    pub action: Option<String>,
    pub limit: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub event_type: Option<String>,
    pub limit: Option<String>,
}

impl CreateAccountRequest {
    fn into_input(self) -> Result<CreateAccountInput, ApiError> {
        let username = validation::validate_username(&self.username)?.to_string();
        let email = validation::validate_email(&self.email)?.to_string();
        validation::validate_password(&self.password)?;
        validation::validate_person_name("First name", &self.first_name)?;
        validation::validate_person_name("Last name", &self.last_name)?;

        Ok(CreateAccountInput {
            username,
            email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            can_revoke_admins: self.can_revoke_admins,
            memorable_information: self.memorable_information,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /admin/admins
/// Create a new admin account (superuser only)
pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let input = payload.into_input()?;

    let user = state
        .shared
        .accounts
        .create_admin(&requestor, input, &ip)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user.into())),
    ))
}

/// GET /admin/admins
/// List all admin accounts (superuser only)
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let admins = state.shared.accounts.list_admins(&requestor).await?;

    Ok(Json(ApiResponse::success(
        admins.into_iter().map(UserDto::from).collect(),
    )))
}

/// DELETE /admin/admins/{id}
/// Revoke admin privileges from the target account (superuser only)
pub async fn revoke_admin(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
    ClientIp(ip): ClientIp,
    Path(target_id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .accounts
        .revoke_admin_privileges(&requestor, target_id, &ip)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Admin privileges revoked successfully.".to_string(),
    })))
}

/// POST /admin/users
/// Create a non-privileged user account (superuser only)
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let input = payload.into_input()?;

    let user = state
        .shared
        .accounts
        .create_user_account(&requestor, input, &ip)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user.into())),
    ))
}

/// GET /admin/users
/// List all non-admin accounts (superuser only)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.shared.accounts.list_users(&requestor).await?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// GET /admin/activity-log
/// Query the admin action stream, newest first (superuser only)
pub async fn activity_log(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<admin_activity_logs::Model>>>, ApiError> {
    require_superuser(&requestor)?;

    let rows = state
        .shared
        .audit
        .list_activity(query.action, query.limit.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(rows)))
}

/// GET /admin/account-history
/// Query the account lifecycle stream, newest first (superuser only)
pub async fn account_history(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(requestor)): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<account_histories::Model>>>, ApiError> {
    require_superuser(&requestor)?;

    let rows = state
        .shared
        .audit
        .list_history(query.event_type, query.limit.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(rows)))
}
