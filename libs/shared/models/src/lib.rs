pub mod auth;
pub mod clinic;
pub mod error;
pub mod interval;

pub use interval::TimeInterval;
