use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::clinic::{ClinicUser, DoctorFilter, VerificationStatus};

use crate::models::{AvailabilityError, DoctorProfile};
use crate::state::DoctorCellState;

/// Admin review of doctor accounts.
pub struct VerificationService {
    store: Arc<dyn ClinicStore>,
}

impl VerificationService {
    pub fn new(state: &DoctorCellState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    fn require_admin(caller: &ClinicUser) -> Result<(), AvailabilityError> {
        if caller.is_admin() {
            Ok(())
        } else {
            warn!("Non-admin user {} attempted an admin action", caller.id);
            Err(AvailabilityError::Unauthorized("Admin access required".to_string()))
        }
    }

    pub async fn list_by_status(
        &self,
        caller: &ClinicUser,
        status: VerificationStatus,
    ) -> Result<Vec<DoctorProfile>, AvailabilityError> {
        Self::require_admin(caller)?;

        let doctors = self
            .store
            .list_doctors(DoctorFilter {
                verification_status: Some(status),
                speciality: None,
            })
            .await?;
        Ok(doctors.into_iter().map(DoctorProfile::from).collect())
    }

    /// Approves or rejects a doctor. PENDING is not a valid target here.
    pub async fn set_status(
        &self,
        caller: &ClinicUser,
        doctor_id: Uuid,
        status: VerificationStatus,
    ) -> Result<DoctorProfile, AvailabilityError> {
        Self::require_admin(caller)?;

        if !matches!(status, VerificationStatus::Verified | VerificationStatus::Rejected) {
            return Err(AvailabilityError::InvalidInput(format!(
                "Invalid verification status: {}",
                status
            )));
        }

        let doctor = self.store.set_verification_status(doctor_id, status).await?;
        info!("Admin {} set doctor {} to {}", caller.id, doctor_id, status);
        Ok(doctor.into())
    }

    /// Suspension returns a doctor to PENDING; reinstatement to VERIFIED.
    pub async fn set_active(
        &self,
        caller: &ClinicUser,
        doctor_id: Uuid,
        suspend: bool,
    ) -> Result<DoctorProfile, AvailabilityError> {
        Self::require_admin(caller)?;

        let status = if suspend {
            VerificationStatus::Pending
        } else {
            VerificationStatus::Verified
        };

        let doctor = self.store.set_verification_status(doctor_id, status).await?;
        info!(
            "Admin {} {} doctor {}",
            caller.id,
            if suspend { "suspended" } else { "reinstated" },
            doctor_id
        );
        Ok(doctor.into())
    }
}
