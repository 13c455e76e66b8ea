pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use models::{AvailabilityError, DaySlots, DoctorProfile, Slot};
pub use router::{admin_routes, doctor_routes};
pub use services::generate_slots;
pub use state::DoctorCellState;
