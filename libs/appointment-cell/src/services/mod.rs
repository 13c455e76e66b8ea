pub mod booking;
pub mod lifecycle;
pub mod locks;
pub mod management;
pub mod video_join;

pub use booking::AppointmentBookingService;
pub use lifecycle::{Actor, AppointmentLifecycleService};
pub use locks::DoctorLockRegistry;
pub use management::AppointmentManagementService;
pub use video_join::VideoJoinService;
