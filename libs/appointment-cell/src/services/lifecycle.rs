// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use shared_models::clinic::{Appointment, AppointmentStatus};

use crate::models::AppointmentError;

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Patient,
    Doctor,
}

/// Appointment state machine. SCHEDULED is the only non-terminal state.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus, actor: Actor) -> Vec<AppointmentStatus> {
        match (current_status, actor) {
            (AppointmentStatus::Scheduled, Actor::Doctor) => {
                vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            (AppointmentStatus::Scheduled, Actor::Patient) => vec![AppointmentStatus::Cancelled],
            // Terminal states - no transitions allowed
            (AppointmentStatus::Completed, _) | (AppointmentStatus::Cancelled, _) => vec![],
        }
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
        actor: Actor,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {} by {:?}", current_status, new_status, actor);

        if !self.get_valid_transitions(current_status, actor).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition(current_status));
        }
        Ok(())
    }

    /// Completion is only possible once the appointment has ended.
    pub fn ensure_completable(&self, appointment: &Appointment, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        self.validate_status_transition(appointment.status, AppointmentStatus::Completed, Actor::Doctor)?;

        if now < appointment.end_time {
            return Err(AppointmentError::OutsideTimeWindow(
                "Cannot mark appointment as completed before the scheduled end time".to_string(),
            ));
        }
        Ok(())
    }

    /// Calls open `lead` before the start and stay open until the end.
    pub fn ensure_joinable(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
        lead: Duration,
    ) -> Result<(), AppointmentError> {
        if appointment.status != AppointmentStatus::Scheduled {
            return Err(AppointmentError::InvalidStatusTransition(appointment.status));
        }

        if now < appointment.start_time - lead {
            return Err(AppointmentError::OutsideTimeWindow(format!(
                "The call will be available {} minutes before the scheduled time",
                lead.num_minutes()
            )));
        }
        if now > appointment.end_time {
            return Err(AppointmentError::OutsideTimeWindow("The appointment has already ended".to_string()));
        }
        Ok(())
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
