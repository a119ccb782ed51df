// src/error.rs

use reqwest::StatusCode;
use thiserror::Error;
use validator::ValidationErrors;

/// Errors produced while talking to the portal REST API.
///
/// Every variant carries the human-readable message shown to the user.
/// Variants are `Clone` so a single in-flight save can hand its result
/// to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    // 401: missing or expired token. The page shell turns this into a login redirect.
    #[error("{0}")]
    Auth(String),

    // 403 / 404
    #[error("{message}")]
    NotFoundOrForbidden { status: u16, message: String },

    // Any other non-2xx, transport failures, and response bodies of the wrong shape.
    #[error("{0}")]
    NetworkOrServer(String),
}

impl ApiError {
    /// Maps a non-2xx status plus the optional `{error}` message from its body.
    pub fn from_status(status: StatusCode, server_message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Auth(
                server_message.unwrap_or_else(|| "Session expired, please log in again".to_string()),
            ),
            StatusCode::FORBIDDEN => ApiError::NotFoundOrForbidden {
                status: status.as_u16(),
                message: server_message.unwrap_or_else(|| "not authorized".to_string()),
            },
            StatusCode::NOT_FOUND => ApiError::NotFoundOrForbidden {
                status: status.as_u16(),
                message: server_message.unwrap_or_else(|| "not found".to_string()),
            },
            _ => ApiError::NetworkOrServer(server_message.unwrap_or_else(|| {
                format!("Server responded with status: {}", status.as_u16())
            })),
        }
    }
}

/// Transport failures (connect, timeout, body read) collapse into `NetworkOrServer`.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("HTTP transport error: {:?}", err);
        ApiError::NetworkOrServer(err.to_string())
    }
}

/// A 2xx body that does not match the expected record is treated as a server fault.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::NetworkOrServer(format!("Unexpected response from server: {}", err))
    }
}

/// Errors returned by the grading workflow operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    #[error("no submission is open for grading")]
    NoDraft,

    #[error("practical {0} is not in the submissions list")]
    UnknownSubmission(String),

    /// Local, pre-network. Messages are also stored on the draft for inline display.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
