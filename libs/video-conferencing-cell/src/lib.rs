// libs/video-conferencing-cell/src/lib.rs
//! # Video Conferencing Cell
//!
//! Boundary to the external video-session provider used for consultations.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                   Video Cell                        |
//! +-----------------------------------------------------+
//! |  models.rs      |  Token roles, connection data     |
//! |  services/      |                                   |
//! |    provider.rs  |  VideoSessionProvider trait       |
//! |    client.rs    |  HTTP client for the video API    |
//! |    stub.rs      |  In-process provider for tests    |
//! +-----------------------------------------------------+
//! ```
//!
//! Sessions are created remotely when an appointment is booked. Client
//! tokens are signed locally with the application secret, so joining a call
//! needs no round trip to the provider.
//!
//! ## Configuration
//!
//! - `VIDEO_API_BASE_URL` - provider base URL
//! - `VIDEO_APPLICATION_ID` - application identifier
//! - `VIDEO_APPLICATION_SECRET` - secret used to sign API and client tokens

pub mod models;
pub mod services;

pub use models::{ConnectionData, TokenRole, VideoError};
pub use services::{StubVideoProvider, VideoApiClient, VideoSessionProvider};
