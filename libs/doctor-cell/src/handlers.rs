use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::clinic::VerificationStatus;
use shared_models::error::AppError;
use shared_utils::extractor::resolve_caller;

use crate::models::{SetAvailabilityRequest, UpdateActiveRequest, UpdateVerificationRequest};
use crate::services::{AvailabilityService, DoctorDirectoryService, SlotService, VerificationService};
use crate::state::DoctorCellState;

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctors_by_speciality(
    State(state): State<DoctorCellState>,
    Path(speciality): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorDirectoryService::new(&state)
        .list_by_speciality(&speciality)
        .await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorDirectoryService::new(&state)
        .get_verified_doctor(doctor_id)
        .await?;

    Ok(Json(json!(doctor)))
}

/// `days` is null when the doctor has not published a window.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let days = SlotService::new(&state)
        .compute_available_slots(doctor_id)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "days": days
    })))
}

// ==============================================================================
// AVAILABILITY HANDLERS (Doctor Configuration)
// ==============================================================================

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<User>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let window = AvailabilityService::new(&state)
        .set_availability(&caller, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "slot": window
    })))
}

#[axum::debug_handler]
pub async fn get_my_availability(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let slots = AvailabilityService::new(&state)
        .list_availability(&caller)
        .await?;

    Ok(Json(json!({ "slots": slots })))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_pending_doctors(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    list_doctors_with_status(state, user, VerificationStatus::Pending).await
}

#[axum::debug_handler]
pub async fn get_verified_doctors(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    list_doctors_with_status(state, user, VerificationStatus::Verified).await
}

async fn list_doctors_with_status(
    state: DoctorCellState,
    user: User,
    status: VerificationStatus,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let doctors = VerificationService::new(&state)
        .list_by_status(&caller, status)
        .await?;

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn update_doctor_status(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateVerificationRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let doctor = VerificationService::new(&state)
        .set_status(&caller, doctor_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn update_doctor_active_status(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateActiveRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(state.store.as_ref(), &user).await?;

    let doctor = VerificationService::new(&state)
        .set_active(&caller, doctor_id, request.suspend)
        .await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}
