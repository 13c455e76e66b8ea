use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_database::ClinicStore;
use shared_models::clinic::{AvailabilityWindow, ClinicUser, NewAvailability};

use crate::models::{AvailabilityError, SetAvailabilityRequest};
use crate::state::DoctorCellState;

pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
}

impl AvailabilityService {
    pub fn new(state: &DoctorCellState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    /// Replaces the caller's open window. Only the time of day of the
    /// request is used when generating slots.
    pub async fn set_availability(
        &self,
        caller: &ClinicUser,
        request: SetAvailabilityRequest,
    ) -> Result<AvailabilityWindow, AvailabilityError> {
        if !caller.is_verified_doctor() {
            warn!("User {} tried to set availability without a verified doctor account", caller.id);
            return Err(AvailabilityError::Unauthorized(
                "Only verified doctors can set availability".to_string(),
            ));
        }

        if request.start_time >= request.end_time {
            return Err(AvailabilityError::InvalidInput(
                "Start time must be before end time".to_string(),
            ));
        }

        // Slots are cut from the time of day, so the window must not wrap midnight.
        if request.start_time.time() >= request.end_time.time() {
            return Err(AvailabilityError::InvalidInput(
                "Availability must start and end on the same day".to_string(),
            ));
        }

        let window = self
            .store
            .replace_availability(NewAvailability {
                doctor_id: caller.id,
                start_time: request.start_time,
                end_time: request.end_time,
            })
            .await?;

        info!(
            "Doctor {} availability set to {} - {}",
            caller.id,
            window.daily_start(),
            window.daily_end()
        );
        Ok(window)
    }

    /// Dashboard read: a store failure degrades to an empty list.
    pub async fn list_availability(&self, caller: &ClinicUser) -> Result<Vec<AvailabilityWindow>, AvailabilityError> {
        if !caller.is_verified_doctor() {
            return Err(AvailabilityError::Unauthorized(
                "Only verified doctors have availability".to_string(),
            ));
        }

        debug!("Listing availability for doctor: {}", caller.id);
        match self.store.list_availability(caller.id).await {
            Ok(windows) => Ok(windows),
            Err(e) => {
                warn!("Failed to load availability for doctor {}: {}", caller.id, e);
                Ok(Vec::new())
            }
        }
    }
}
