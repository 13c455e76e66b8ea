// libs/video-conferencing-cell/src/services/client.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_utils::jwt::sign_token;

use crate::models::{
    ApiClaims, ClientTokenClaims, ConnectionData, CreateSessionRequest, CreatedSession, TokenRole,
    VideoError,
};
use crate::services::provider::VideoSessionProvider;

/// API calls are authorised with a short-lived JWT minted per request.
const API_TOKEN_TTL_SECONDS: i64 = 300;

/// HTTP client for the hosted video API.
#[derive(Debug)]
pub struct VideoApiClient {
    client: Client,
    base_url: String,
    application_id: String,
    application_secret: String,
}

impl VideoApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, VideoError> {
        if !config.is_video_configured() {
            return Err(VideoError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.video_api_base_url.trim_end_matches('/').to_string(),
            application_id: config.video_application_id.clone(),
            application_secret: config.video_application_secret.clone(),
        })
    }

    fn api_token(&self) -> Result<String, VideoError> {
        let now = Utc::now().timestamp();
        let claims = ApiClaims {
            iss: &self.application_id,
            application_id: &self.application_id,
            iat: now,
            exp: now + API_TOKEN_TTL_SECONDS,
            jti: Uuid::new_v4().to_string(),
        };

        sign_token(&claims, &self.application_secret).map_err(|message| VideoError::Token { message })
    }
}

#[async_trait]
impl VideoSessionProvider for VideoApiClient {
    /// POST /session/create
    async fn create_session(&self) -> Result<String, VideoError> {
        let url = format!("{}/session/create", self.base_url);
        debug!("Sending session creation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_token()?)
            .header("Content-Type", "application/json")
            .json(&CreateSessionRequest { media_mode: "routed" })
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Video session creation failed: {} - {}", status, response_text);
            return Err(VideoError::Api {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let sessions: Vec<CreatedSession> = serde_json::from_str(&response_text).map_err(|e| VideoError::Api {
            message: format!("Failed to parse session response: {}", e),
        })?;

        let session = sessions.into_iter().next().ok_or_else(|| VideoError::Api {
            message: "Session response was empty".to_string(),
        })?;

        info!("Created video session: {}", session.session_id);
        Ok(session.session_id)
    }

    fn generate_token(
        &self,
        session_id: &str,
        role: TokenRole,
        expires_at: DateTime<Utc>,
        connection_data: &ConnectionData,
    ) -> Result<String, VideoError> {
        let now = Utc::now();
        if expires_at <= now {
            return Err(VideoError::Token {
                message: "Expiry must be in the future".to_string(),
            });
        }

        let connection_data = serde_json::to_string(connection_data).map_err(|e| VideoError::Token {
            message: format!("Invalid connection data: {}", e),
        })?;

        let claims = ClientTokenClaims {
            iss: &self.application_id,
            application_id: &self.application_id,
            scope: "session.connect",
            session_id,
            role,
            connection_data,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = sign_token(&claims, &self.application_secret).map_err(|message| VideoError::Token { message })?;
        debug!("Issued {} token for session {} expiring at {}", role, session_id, expires_at);
        Ok(token)
    }
}
