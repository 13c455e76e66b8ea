use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::{ConnectionData, TokenRole, VideoError};
use crate::services::provider::VideoSessionProvider;

/// In-process provider for tests and local runs without video credentials.
/// Session ids are sequential; tokens are opaque strings.
#[derive(Debug, Default)]
pub struct StubVideoProvider {
    fail_create: AtomicBool,
    sessions_created: AtomicUsize,
}

impl StubVideoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later `create_session` call fails until reset.
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSessionProvider for StubVideoProvider {
    async fn create_session(&self) -> Result<String, VideoError> {
        if self.fail_create.load(Ordering::SeqCst) {
            warn!("Stub video provider configured to fail session creation");
            return Err(VideoError::Api {
                message: "stub session creation failure".to_string(),
            });
        }

        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("stub-session-{}", n))
    }

    fn generate_token(
        &self,
        session_id: &str,
        role: TokenRole,
        expires_at: DateTime<Utc>,
        connection_data: &ConnectionData,
    ) -> Result<String, VideoError> {
        Ok(format!(
            "stub-token:{}:{}:{}:{}",
            session_id,
            role,
            connection_data.user_id,
            expires_at.timestamp()
        ))
    }
}
