use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failure classes shared by every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidInput,
    PreconditionFailed,
    DependencyFailure,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Dependency failure: {0}")]
    DependencyFailure(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::Unauthorized => AppError::Unauthorized(message),
            ErrorKind::InvalidInput => AppError::InvalidInput(message),
            ErrorKind::PreconditionFailed => AppError::PreconditionFailed(message),
            ErrorKind::DependencyFailure => AppError::DependencyFailure(message),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::NotFound(_) => Some(ErrorKind::NotFound),
            AppError::Unauthorized(_) => Some(ErrorKind::Unauthorized),
            AppError::InvalidInput(_) => Some(ErrorKind::InvalidInput),
            AppError::PreconditionFailed(_) => Some(ErrorKind::PreconditionFailed),
            AppError::DependencyFailure(_) => Some(ErrorKind::DependencyFailure),
            AppError::Auth(_) | AppError::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PreconditionFailed(msg) => (StatusCode::CONFLICT, msg),
            AppError::DependencyFailure(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::warn!("Request rejected: {}: {}", status, message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
