//! Appointment booking, lifecycle and video join.
//!
//! ```text
//!   POST /appointments ──► AppointmentBookingService
//!                            ├─ patient / doctor / range / credits checks
//!                            ├─ per-doctor lock + overlap check
//!                            ├─ VideoSessionProvider::create_session
//!                            └─ ClinicStore::create_booking (row + ledger, atomic)
//! ```

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use models::{AppointmentError, BookAppointmentRequest, VideoTokenResponse};
pub use router::appointment_routes;
pub use services::{
    AppointmentBookingService, AppointmentLifecycleService, AppointmentManagementService, VideoJoinService,
};
pub use state::AppointmentCellState;
