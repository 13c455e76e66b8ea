use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::clinic::{
    Appointment, AppointmentFilter, AppointmentPatch, AvailabilityWindow, ClinicUser,
    CreditTransaction, DoctorFilter, NewAvailability, NewBooking, VerificationStatus,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Requested time overlaps an existing appointment")]
    Overlap,

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

/// Persistence boundary for users, availability windows, appointments and
/// the credit ledger.
///
/// `create_booking` and `cancel_booking` must commit the appointment change,
/// both ledger entries and both balance updates together or not at all.
/// `create_booking` is a conditional insert: it fails with
/// [`StoreError::Overlap`] when a SCHEDULED appointment of the same doctor
/// overlaps the new interval, and with [`StoreError::InsufficientCredits`]
/// when the patient balance no longer covers the cost.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<ClinicUser>, StoreError>;
    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<ClinicUser>, StoreError>;
    async fn list_doctors(&self, filter: DoctorFilter) -> Result<Vec<ClinicUser>, StoreError>;
    async fn set_verification_status(
        &self,
        doctor_id: Uuid,
        status: VerificationStatus,
    ) -> Result<ClinicUser, StoreError>;

    async fn find_available_window(&self, doctor_id: Uuid) -> Result<Option<AvailabilityWindow>, StoreError>;
    async fn list_availability(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, StoreError>;
    /// Deletes the doctor's AVAILABLE windows and inserts the new one.
    async fn replace_availability(&self, window: NewAvailability) -> Result<AvailabilityWindow, StoreError>;

    async fn find_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;
    async fn list_appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;
    async fn create_booking(&self, booking: NewBooking) -> Result<Appointment, StoreError>;
    /// Marks a SCHEDULED appointment CANCELLED and refunds `credit_cost`.
    async fn cancel_booking(&self, appointment_id: Uuid, credit_cost: i64) -> Result<Appointment, StoreError>;
    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, StoreError>;

    async fn list_credit_transactions(&self, user_id: Uuid) -> Result<Vec<CreditTransaction>, StoreError>;
}
