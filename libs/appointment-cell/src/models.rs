// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::clinic::AppointmentStatus;
use shared_models::error::{AppError, ErrorKind};

// ==============================================================================
// REQUEST / RESPONSE DTOs
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNotesRequest {
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoTokenResponse {
    pub video_session_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Only patients can book appointments")]
    NotAPatient,

    #[error("Doctor not found or not verified")]
    DoctorNotFound,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Insufficient credits: booking requires {required}")]
    InsufficientCredits { required: i64 },

    #[error("This time slot is already booked")]
    ConflictDetected,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("{0}")]
    OutsideTimeWindow(String),

    #[error("No video session associated with this appointment")]
    NoVideoSession,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Video service error: {0}")]
    VideoServiceError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppointmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppointmentError::NotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::DoctorNotFound => ErrorKind::NotFound,
            AppointmentError::NotAPatient | AppointmentError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppointmentError::InvalidTime(_) => ErrorKind::InvalidInput,
            AppointmentError::InsufficientCredits { .. }
            | AppointmentError::ConflictDetected
            | AppointmentError::InvalidStatusTransition(_)
            | AppointmentError::OutsideTimeWindow(_)
            | AppointmentError::NoVideoSession => ErrorKind::PreconditionFailed,
            AppointmentError::VideoServiceError(_) | AppointmentError::DatabaseError(_) => {
                ErrorKind::DependencyFailure
            }
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        AppError::from_kind(err.kind(), err.to_string())
    }
}
