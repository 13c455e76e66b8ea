pub mod availability;
pub mod directory;
pub mod slots;
pub mod verification;

pub use availability::AvailabilityService;
pub use directory::DoctorDirectoryService;
pub use slots::{generate_slots, SlotService};
pub use verification::VerificationService;
