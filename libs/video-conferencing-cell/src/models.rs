// libs/video-conferencing-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::clinic::UserRole;

/// Capability granted by a client token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    Publisher,
    Subscriber,
    Moderator,
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRole::Publisher => write!(f, "publisher"),
            TokenRole::Subscriber => write!(f, "subscriber"),
            TokenRole::Moderator => write!(f, "moderator"),
        }
    }
}

/// Identity embedded in a client token and shown to the other participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub name: String,
    pub role: UserRole,
    pub user_id: Uuid,
}

// ==============================================================================
// WIRE TYPES
// ==============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionRequest {
    pub media_mode: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedSession {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiClaims<'a> {
    pub iss: &'a str,
    pub application_id: &'a str,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClientTokenClaims<'a> {
    pub iss: &'a str,
    pub application_id: &'a str,
    pub scope: &'static str,
    pub session_id: &'a str,
    pub role: TokenRole,
    pub connection_data: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video provider not configured")]
    NotConfigured,

    #[error("Video API error: {message}")]
    Api { message: String },

    #[error("Video API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to issue video token: {message}")]
    Token { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_data_uses_camel_case_keys() {
        let data = ConnectionData {
            name: "Dr. Rao".to_string(),
            role: UserRole::Doctor,
            user_id: Uuid::nil(),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["role"], "DOCTOR");
        assert!(value.get("userId").is_some());
    }

    #[test]
    fn token_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenRole::Publisher).unwrap(), "\"publisher\"");
        assert_eq!(TokenRole::Moderator.to_string(), "moderator");
    }
}
