// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::resolve_caller;

use crate::models::{AddNotesRequest, BookAppointmentRequest};
use crate::services::{AppointmentBookingService, AppointmentManagementService, VideoJoinService};
use crate::state::AppointmentCellState;

// ==============================================================================
// BOOKING
// ==============================================================================

/// The caller books for themselves; the body names the doctor and the range.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let appointment = AppointmentBookingService::new(&state)
        .book_appointment(
            request.doctor_id,
            caller.id,
            request.start_time,
            request.end_time,
            request.description,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

// ==============================================================================
// LIFECYCLE
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let appointment = AppointmentManagementService::new(&state)
        .cancel_appointment(&caller, appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let appointment = AppointmentManagementService::new(&state)
        .complete_appointment(&caller, appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn add_appointment_notes(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AddNotesRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let appointment = AppointmentManagementService::new(&state)
        .add_notes(&caller, appointment_id, request.notes)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn generate_video_token(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let response = VideoJoinService::new(&state)
        .generate_video_token(&caller, appointment_id)
        .await?;

    info!("Video token issued for appointment {}", appointment_id);
    Ok(Json(json!({
        "success": true,
        "video_session_id": response.video_session_id,
        "token": response.token,
        "expires_at": response.expires_at
    })))
}

// ==============================================================================
// LISTINGS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let appointments = AppointmentManagementService::new(&state)
        .list_patient_appointments(&caller)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let appointments = AppointmentManagementService::new(&state)
        .list_doctor_appointments(&caller)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_credit_transactions(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let transactions = AppointmentManagementService::new(&state)
        .list_credit_transactions(&caller)
        .await?;

    Ok(Json(json!({
        "credits": caller.credits,
        "transactions": transactions
    })))
}
