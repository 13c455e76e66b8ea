use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::{ClinicUser, VerificationStatus};
use shared_models::error::{AppError, ErrorKind};

// ==============================================================================
// SLOTS
// ==============================================================================

/// A free bookable interval derived from the availability window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// e.g. "9:00 AM - 9:30 AM"
    pub formatted: String,
    /// e.g. "Monday, August 21"
    pub day: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub display_date: String,
    pub slots: Vec<Slot>,
}

// ==============================================================================
// DOCTOR PROFILES
// ==============================================================================

/// Public view of a doctor; balances are never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub speciality: Option<String>,
    pub experience: Option<i32>,
    pub description: Option<String>,
    pub verification_status: Option<VerificationStatus>,
}

impl From<ClinicUser> for DoctorProfile {
    fn from(user: ClinicUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            speciality: user.speciality,
            experience: user.experience,
            description: user.description,
            verification_status: user.verification_status,
        }
    }
}

// ==============================================================================
// REQUEST DTOs
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVerificationRequest {
    pub status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActiveRequest {
    pub suspend: bool,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    Dependency(String),
}

impl AvailabilityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AvailabilityError::NotFound(_) => ErrorKind::NotFound,
            AvailabilityError::Unauthorized(_) => ErrorKind::Unauthorized,
            AvailabilityError::InvalidInput(_) => ErrorKind::InvalidInput,
            AvailabilityError::Dependency(_) => ErrorKind::DependencyFailure,
        }
    }
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AvailabilityError::NotFound(format!("{} not found", what)),
            other => AvailabilityError::Dependency(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        AppError::from_kind(err.kind(), err.to_string())
    }
}
