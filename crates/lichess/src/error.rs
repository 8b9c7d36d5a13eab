//! Lichess client error types

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized (check the API token)")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Lichess refused the request (HTTP 400): illegal move, bad challenge, ...
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Rate limited by Lichess")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ClientError {
    /// Classify a non-success response. `body` is the raw response text;
    /// Lichess usually sends `{"error": "..."}`.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::Rejected(message),
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            _ => ClientError::Status {
                status: status.as_u16(),
                body: message,
            },
        }
    }

    /// Network trouble, rate limiting or a server-side failure. Worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::RateLimited | ClientError::Stream(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
