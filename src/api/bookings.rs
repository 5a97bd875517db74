use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AuthUser, ClientIp};
use super::{ApiError, ApiResponse, AppState, MessageResponse, validation};
use crate::db::repositories::booking::BookingInput;
use crate::entities::{bookings, users};
use crate::services::AdminAction;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct BookingRequest {
    /// Admins may create a booking on another user's behalf.
    pub user_id: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub service: String,
    pub booking_date: String,
    pub booking_time: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "pending".to_string()
}

impl BookingRequest {
    fn into_input(self) -> Result<BookingInput, ApiError> {
        if self.full_name.trim().is_empty() {
            return Err(ApiError::validation("Full name is required"));
        }
        let email = validation::validate_email(&self.email)?.to_string();
        if self.service.trim().is_empty() {
            return Err(ApiError::validation("Service is required"));
        }
        if self.booking_date.trim().is_empty() {
            return Err(ApiError::validation("Booking date is required"));
        }
        if self.booking_time.trim().is_empty() {
            return Err(ApiError::validation("Booking time is required"));
        }
        validation::validate_booking_status(&self.status)?;

        Ok(BookingInput {
            full_name: self.full_name,
            email,
            service: self.service,
            booking_date: self.booking_date,
            booking_time: self.booking_time,
            notes: self.notes,
            status: self.status,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /bookings
/// Admins see every booking; everyone else sees only their own
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<bookings::Model>>>, ApiError> {
    let rows = if actor.is_superuser {
        state.store().bookings().list_all().await?
    } else {
        state.store().bookings().list_for_user(actor.id).await?
    };

    Ok(Json(ApiResponse::success(rows)))
}

/// POST /bookings
/// Create a booking; admins may target another user via `user_id`
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<bookings::Model>>), ApiError> {
    let target_user_id = resolve_target_user(&state, &actor, payload.user_id).await?;
    let input = payload.into_input()?;

    let booking = state.store().bookings().create(target_user_id, input).await?;

    if actor.is_superuser {
        state
            .shared
            .audit
            .record_admin_action(
                Some(actor.id),
                AdminAction::CreateBooking,
                Some(target_user_id),
                &format!(
                    "Created booking #{} for service '{}'",
                    booking.id, booking.service
                ),
                &ip,
            )
            .await;
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking))))
}

/// GET /bookings/{id}
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bookings::Model>>, ApiError> {
    let booking = fetch_visible_booking(&state, &actor, id).await?;

    Ok(Json(ApiResponse::success(booking)))
}

/// PUT /bookings/{id}
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i32>,
    Json(payload): Json<BookingRequest>,
) -> Result<Json<ApiResponse<bookings::Model>>, ApiError> {
    let booking = fetch_visible_booking(&state, &actor, id).await?;
    let input = payload.into_input()?;

    let updated = state.store().bookings().update(booking, input).await?;

    if actor.is_superuser {
        state
            .shared
            .audit
            .record_admin_action(
                Some(actor.id),
                AdminAction::UpdateBooking,
                Some(updated.user_id),
                &format!("Updated booking #{}", updated.id),
                &ip,
            )
            .await;
    }

    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /bookings/{id}
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let booking = fetch_visible_booking(&state, &actor, id).await?;

    state.store().bookings().delete(booking.id).await?;

    if actor.is_superuser {
        state
            .shared
            .audit
            .record_admin_action(
                Some(actor.id),
                AdminAction::DeleteBooking,
                Some(booking.user_id),
                &format!("Deleted booking #{}", booking.id),
                &ip,
            )
            .await;
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Booking deleted successfully.".to_string(),
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve the user a booking belongs to. Only admins may point at someone
/// else; an unknown target silently falls back to the actor.
async fn resolve_target_user(
    state: &Arc<AppState>,
    actor: &users::Model,
    requested: Option<i32>,
) -> Result<i32, ApiError> {
    if !actor.is_superuser {
        return Ok(actor.id);
    }

    let Some(target_id) = requested else {
        return Ok(actor.id);
    };

    match state.store().users().get_by_id(target_id).await? {
        Some(target) => Ok(target.id),
        None => Ok(actor.id),
    }
}

/// Fetch a booking the actor is allowed to see. Hidden bookings 404 the
/// same way as missing ones, so ownership cannot be probed.
async fn fetch_visible_booking(
    state: &Arc<AppState>,
    actor: &users::Model,
    id: i32,
) -> Result<bookings::Model, ApiError> {
    let booking = state
        .store()
        .bookings()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking", id))?;

    if booking.user_id != actor.id && !actor.is_superuser {
        return Err(ApiError::not_found("Booking", id));
    }

    Ok(booking)
}
