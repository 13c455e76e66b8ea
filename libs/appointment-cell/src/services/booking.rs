// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::clinic::{Appointment, AppointmentFilter, NewBooking};
use shared_models::TimeInterval;
use video_conferencing_cell::VideoSessionProvider;

use crate::models::AppointmentError;
use crate::services::locks::DoctorLockRegistry;
use crate::state::AppointmentCellState;

pub struct AppointmentBookingService {
    store: Arc<dyn ClinicStore>,
    video: Arc<dyn VideoSessionProvider>,
    locks: Arc<DoctorLockRegistry>,
    credit_cost: i64,
}

impl AppointmentBookingService {
    pub fn new(state: &AppointmentCellState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            video: Arc::clone(&state.video),
            locks: Arc::clone(&state.locks),
            credit_cost: state.config.scheduling.appointment_credit_cost,
        }
    }

    /// Books `[start_time, end_time)` with a doctor for a patient.
    ///
    /// Checks run in a fixed order and the first failure wins: patient,
    /// doctor, time range, credit balance, overlap. The video session is
    /// created before any credit moves; the appointment row, both ledger
    /// entries and both balance updates are then written in one store call.
    pub async fn book_appointment(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        description: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for patient {} with doctor {}", patient_id, doctor_id);

        let patient = self
            .store
            .find_user(patient_id)
            .await
            .map_err(store_failure)?
            .ok_or(AppointmentError::PatientNotFound)?;
        if !patient.is_patient() {
            warn!("User {} with role {} attempted to book", patient_id, patient.role);
            return Err(AppointmentError::NotAPatient);
        }

        let doctor = self
            .store
            .find_user(doctor_id)
            .await
            .map_err(store_failure)?
            .filter(|doctor| doctor.is_verified_doctor())
            .ok_or(AppointmentError::DoctorNotFound)?;

        let requested = TimeInterval::new(start_time, end_time);
        if requested.is_empty() {
            return Err(AppointmentError::InvalidTime(
                "Start time must be before end time".to_string(),
            ));
        }

        if patient.credits < self.credit_cost {
            warn!(
                "Patient {} has {} credits, booking requires {}",
                patient.id, patient.credits, self.credit_cost
            );
            return Err(AppointmentError::InsufficientCredits {
                required: self.credit_cost,
            });
        }

        // Held until the row is written so a concurrent request for the same
        // doctor sees it in its own overlap check.
        let _guard = self.locks.acquire(doctor.id).await;

        self.ensure_no_overlap(doctor.id, &requested).await?;

        let video_session_id = self.video.create_session().await.map_err(|e| {
            error!("Failed to create video session: {}", e);
            AppointmentError::VideoServiceError(e.to_string())
        })?;

        let appointment = self
            .store
            .create_booking(NewBooking {
                patient_id: patient.id,
                doctor_id: doctor.id,
                start_time,
                end_time,
                patient_description: description,
                video_session_id,
                credit_cost: self.credit_cost,
            })
            .await
            .map_err(|e| match e {
                StoreError::Overlap => AppointmentError::ConflictDetected,
                StoreError::InsufficientCredits => AppointmentError::InsufficientCredits {
                    required: self.credit_cost,
                },
                StoreError::NotFound(what) if what == "Doctor" => AppointmentError::DoctorNotFound,
                StoreError::NotFound(_) => AppointmentError::PatientNotFound,
                other => {
                    error!("Failed to persist booking: {}", other);
                    store_failure(other)
                }
            })?;

        info!(
            "Appointment {} booked for patient {} with doctor {}",
            appointment.id, patient.id, doctor.id
        );
        Ok(appointment)
    }

    async fn ensure_no_overlap(&self, doctor_id: Uuid, requested: &TimeInterval) -> Result<(), AppointmentError> {
        let filter = AppointmentFilter {
            starts_on_or_before: Some(requested.end),
            ..AppointmentFilter::scheduled_for_doctor(doctor_id)
        };
        let scheduled = self.store.list_appointments(filter).await.map_err(store_failure)?;

        if let Some(existing) = scheduled.iter().find(|apt| apt.interval().overlaps(requested)) {
            warn!(
                "Requested {} - {} overlaps appointment {} of doctor {}",
                requested.start, requested.end, existing.id, doctor_id
            );
            return Err(AppointmentError::ConflictDetected);
        }

        debug!("No overlap for doctor {} at {}", doctor_id, requested.start);
        Ok(())
    }
}

pub(crate) fn store_failure(err: StoreError) -> AppointmentError {
    match err {
        StoreError::NotFound(_) => AppointmentError::NotFound,
        other => AppointmentError::DatabaseError(other.to_string()),
    }
}
