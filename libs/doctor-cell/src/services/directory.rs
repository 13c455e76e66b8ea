use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::clinic::{DoctorFilter, VerificationStatus};

use crate::models::{AvailabilityError, DoctorProfile};
use crate::state::DoctorCellState;

/// Public lookups over verified doctors.
pub struct DoctorDirectoryService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorDirectoryService {
    pub fn new(state: &DoctorCellState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    pub async fn get_verified_doctor(&self, doctor_id: Uuid) -> Result<DoctorProfile, AvailabilityError> {
        debug!("Fetching doctor profile: {}", doctor_id);
        self.store
            .find_user(doctor_id)
            .await?
            .filter(|user| user.is_verified_doctor())
            .map(DoctorProfile::from)
            .ok_or_else(|| AvailabilityError::NotFound("Doctor not found".to_string()))
    }

    /// Verified doctors of one speciality, ordered by name.
    pub async fn list_by_speciality(&self, speciality: &str) -> Result<Vec<DoctorProfile>, AvailabilityError> {
        let speciality = speciality.trim();
        if speciality.is_empty() {
            return Err(AvailabilityError::InvalidInput("Speciality is required".to_string()));
        }

        debug!("Listing verified doctors for speciality: {}", speciality);
        let doctors = self
            .store
            .list_doctors(DoctorFilter {
                verification_status: Some(VerificationStatus::Verified),
                speciality: Some(speciality.to_string()),
            })
            .await?;

        Ok(doctors.into_iter().map(DoctorProfile::from).collect())
    }
}
