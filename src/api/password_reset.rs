use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, TokenValidity, validation};
use crate::services::TokenStatus;

#[derive(Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ConfirmResetRequest {
    pub token: String,
    pub new_password: String,
}

/// POST /auth/password-reset/request
/// Issue a reset token for the given email and send the reset link
pub async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::validate_email(&payload.email)?;

    state.shared.password_reset.request_reset(email).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password reset email sent successfully. Please check your inbox.".to_string(),
    })))
}

/// POST /auth/password-reset/validate
/// Probe whether a reset token is still usable, without consuming it.
/// Failures keep the `valid` flag in the body so clients branch on one field.
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateTokenRequest>,
) -> Result<Response, ApiError> {
    if payload.token.is_empty() {
        return Ok(invalid_token("Token is required"));
    }

    match state
        .shared
        .password_reset
        .validate_token(&payload.token)
        .await?
    {
        TokenStatus::Valid => Ok(Json(ApiResponse::success(TokenValidity {
            valid: true,
            message: "Token is valid.".to_string(),
        }))
        .into_response()),
        TokenStatus::ExpiredOrUsed => {
            Ok(invalid_token("Token has expired or already been used."))
        }
        TokenStatus::NotFound => Ok(invalid_token("Invalid token.")),
    }
}

fn invalid_token(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "success": false,
            "valid": false,
            "error": message,
        })),
    )
        .into_response()
}

/// POST /auth/password-reset/confirm
/// Consume a valid token and set the new password
pub async fn confirm_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.token.is_empty() {
        return Err(ApiError::validation("Token is required"));
    }

    state
        .shared
        .password_reset
        .confirm_reset(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password has been reset successfully.".to_string(),
    })))
}
