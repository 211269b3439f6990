// Client error taxonomy shared by every layer
use thiserror::Error;

use crate::validation::ValidationError;

/// Shown when a failure carries no backend-provided detail
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Every failure the client can surface to a view
#[derive(Debug, Error)]
pub enum ClientError {
    // Client-side checks, no request was issued
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // Non-2xx response from the backend
    #[error("request failed with status {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Request { status: u16, detail: Option<String> },

    // Transport failure before any response arrived
    #[error("network error: {0}")]
    Network(String),

    // Credential exchange rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    // 2xx response whose body did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn request(status: u16, detail: Option<String>) -> Self {
        ClientError::Request { status, detail }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ClientError::Network(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        ClientError::Auth(message.into())
    }

    /// HTTP status when the backend answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend-provided detail message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Request { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// Text for a transient user-facing notification
    pub fn user_message(&self) -> String {
        self.user_message_or(GENERIC_FAILURE)
    }

    /// Like `user_message`, with a caller-chosen fallback for failures without detail
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(err) => err.to_string(),
            ClientError::Request { detail: Some(detail), .. } => detail.clone(),
            ClientError::Auth(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Stable code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "VALIDATION_ERROR",
            ClientError::Request { status: 401, .. } => "UNAUTHORIZED",
            ClientError::Request { status: 403, .. } => "FORBIDDEN",
            ClientError::Request { status: 404, .. } => "NOT_FOUND",
            ClientError::Request { .. } => "REQUEST_ERROR",
            ClientError::Network(_) => "NETWORK_ERROR",
            ClientError::Auth(_) => "AUTH_ERROR",
            ClientError::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::request(status.as_u16(), None)
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
