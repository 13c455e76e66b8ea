use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, AppointmentCellState};
use doctor_cell::{admin_routes, doctor_routes, DoctorCellState};
use shared_config::AppConfig;
use shared_database::ClinicStore;
use shared_utils::clock::Clock;
use video_conferencing_cell::VideoSessionProvider;

/// Process-wide collaborators handed to each cell.
#[derive(Clone)]
pub struct AppServices {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub video: Arc<dyn VideoSessionProvider>,
    pub clock: Arc<dyn Clock>,
}

pub fn create_router(services: AppServices) -> Router {
    let doctor_state = DoctorCellState::new(
        Arc::clone(&services.config),
        Arc::clone(&services.store),
        Arc::clone(&services.clock),
    );
    let appointment_state = AppointmentCellState::new(
        services.config,
        services.store,
        services.video,
        services.clock,
    );

    Router::new()
        .route("/", get(|| async { "MediMeet API is running!" }))
        .nest("/doctors", doctor_routes(doctor_state.clone()))
        .nest("/admin", admin_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
}
