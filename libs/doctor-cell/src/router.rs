use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::DoctorCellState;

pub fn doctor_routes(state: DoctorCellState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/speciality/{speciality}", get(handlers::get_doctors_by_speciality))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/slots", get(handlers::get_available_slots));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/availability",
            get(handlers::get_my_availability).post(handlers::set_availability),
        )
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

pub fn admin_routes(state: DoctorCellState) -> Router {
    Router::new()
        .route("/doctors/pending", get(handlers::get_pending_doctors))
        .route("/doctors/verified", get(handlers::get_verified_doctors))
        .route("/doctors/{doctor_id}/status", patch(handlers::update_doctor_status))
        .route("/doctors/{doctor_id}/active", patch(handlers::update_doctor_active_status))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
