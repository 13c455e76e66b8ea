use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ConnectionData, TokenRole, VideoError};

/// External video-session provider.
#[async_trait]
pub trait VideoSessionProvider: Send + Sync {
    /// Creates a routed session and returns its provider-side id.
    async fn create_session(&self) -> Result<String, VideoError>;

    /// Issues a client token for `session_id` valid until `expires_at`.
    fn generate_token(
        &self,
        session_id: &str,
        role: TokenRole,
        expires_at: DateTime<Utc>,
        connection_data: &ConnectionData,
    ) -> Result<String, VideoError>;
}
