use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::ClinicStore;
use shared_utils::clock::Clock;
use video_conferencing_cell::VideoSessionProvider;

use crate::services::locks::DoctorLockRegistry;

#[derive(Clone)]
pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub video: Arc<dyn VideoSessionProvider>,
    pub clock: Arc<dyn Clock>,
    pub locks: Arc<DoctorLockRegistry>,
}

impl AppointmentCellState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn ClinicStore>,
        video: Arc<dyn VideoSessionProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            video,
            clock,
            locks: Arc::new(DoctorLockRegistry::new()),
        }
    }
}
