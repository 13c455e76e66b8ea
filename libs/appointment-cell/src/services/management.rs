// libs/appointment-cell/src/services/management.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::clinic::{
    Appointment, AppointmentFilter, AppointmentPatch, AppointmentStatus, ClinicUser, CreditTransaction,
};
use shared_utils::clock::Clock;

use crate::models::AppointmentError;
use crate::services::booking::store_failure;
use crate::services::lifecycle::{Actor, AppointmentLifecycleService};
use crate::state::AppointmentCellState;

/// Cancellation, completion, notes and per-user listings.
pub struct AppointmentManagementService {
    store: Arc<dyn ClinicStore>,
    clock: Arc<dyn Clock>,
    lifecycle: AppointmentLifecycleService,
    credit_cost: i64,
}

impl AppointmentManagementService {
    pub fn new(state: &AppointmentCellState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            clock: Arc::clone(&state.clock),
            lifecycle: AppointmentLifecycleService::new(),
            credit_cost: state.config.scheduling.appointment_credit_cost,
        }
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .find_appointment(appointment_id)
            .await
            .map_err(store_failure)?
            .ok_or(AppointmentError::NotFound)
    }

    /// Either party may cancel; the booking credits are refunded atomically.
    pub async fn cancel_appointment(
        &self,
        caller: &ClinicUser,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        let actor = if appointment.patient_id == caller.id {
            Actor::Patient
        } else if appointment.doctor_id == caller.id {
            Actor::Doctor
        } else {
            warn!("User {} tried to cancel appointment {}", caller.id, appointment_id);
            return Err(AppointmentError::Unauthorized(
                "You are not authorized to cancel this appointment".to_string(),
            ));
        };

        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Cancelled, actor)?;

        let cancelled = self
            .store
            .cancel_booking(appointment_id, self.credit_cost)
            .await
            .map_err(|e| match e {
                StoreError::InvalidState(_) => AppointmentError::InvalidStatusTransition(appointment.status),
                other => store_failure(other),
            })?;

        info!("Appointment {} cancelled by {:?} {}", appointment_id, actor, caller.id);
        Ok(cancelled)
    }

    pub async fn complete_appointment(
        &self,
        caller: &ClinicUser,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_owned_by_doctor(caller, appointment_id).await?;

        self.lifecycle.ensure_completable(&appointment, self.clock.now())?;

        let completed = self
            .store
            .update_appointment(
                appointment_id,
                AppointmentPatch {
                    expected_status: Some(AppointmentStatus::Scheduled),
                    status: Some(AppointmentStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                StoreError::InvalidState(_) => AppointmentError::InvalidStatusTransition(appointment.status),
                other => store_failure(other),
            })?;

        info!("Appointment {} marked completed", appointment_id);
        Ok(completed)
    }

    /// Notes may change in any status.
    pub async fn add_notes(
        &self,
        caller: &ClinicUser,
        appointment_id: Uuid,
        notes: String,
    ) -> Result<Appointment, AppointmentError> {
        self.load_owned_by_doctor(caller, appointment_id).await?;

        let updated = self
            .store
            .update_appointment(
                appointment_id,
                AppointmentPatch {
                    notes: Some(notes),
                    ..Default::default()
                },
            )
            .await
            .map_err(store_failure)?;

        debug!("Notes updated for appointment {}", appointment_id);
        Ok(updated)
    }

    async fn load_owned_by_doctor(
        &self,
        caller: &ClinicUser,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        if !caller.is_verified_doctor() {
            return Err(AppointmentError::Unauthorized(
                "Only verified doctors can manage appointments".to_string(),
            ));
        }

        let appointment = self.load(appointment_id).await?;
        if appointment.doctor_id != caller.id {
            warn!("Doctor {} does not own appointment {}", caller.id, appointment_id);
            return Err(AppointmentError::Unauthorized(
                "Appointment not found or not authorized".to_string(),
            ));
        }
        Ok(appointment)
    }

    /// Every appointment of the patient, ordered by start.
    pub async fn list_patient_appointments(&self, caller: &ClinicUser) -> Result<Vec<Appointment>, AppointmentError> {
        if !caller.is_patient() {
            return Err(AppointmentError::NotAPatient);
        }

        self.store
            .list_appointments(AppointmentFilter {
                patient_id: Some(caller.id),
                ..Default::default()
            })
            .await
            .map_err(store_failure)
    }

    /// The doctor's SCHEDULED appointments, ordered by start.
    pub async fn list_doctor_appointments(&self, caller: &ClinicUser) -> Result<Vec<Appointment>, AppointmentError> {
        if !caller.is_verified_doctor() {
            return Err(AppointmentError::Unauthorized(
                "Only verified doctors have a schedule".to_string(),
            ));
        }

        self.store
            .list_appointments(AppointmentFilter::scheduled_for_doctor(caller.id))
            .await
            .map_err(store_failure)
    }

    /// The caller's own ledger, newest first.
    pub async fn list_credit_transactions(&self, caller: &ClinicUser) -> Result<Vec<CreditTransaction>, AppointmentError> {
        self.store
            .list_credit_transactions(caller.id)
            .await
            .map_err(store_failure)
    }
}
