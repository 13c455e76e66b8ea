pub mod client;
pub mod provider;
pub mod stub;

pub use client::VideoApiClient;
pub use provider::VideoSessionProvider;
pub use stub::StubVideoProvider;
