use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::ClinicStore;
use shared_utils::clock::Clock;

/// Shared handles for doctor and admin routes.
#[derive(Clone)]
pub struct DoctorCellState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub clock: Arc<dyn Clock>,
}

impl DoctorCellState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn ClinicStore>, clock: Arc<dyn Clock>) -> Self {
        Self { config, store, clock }
    }
}
