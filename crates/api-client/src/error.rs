use reqwest::StatusCode;
use thiserror::Error;

use deskcheck_api::ErrorResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Extract the `error` field from a JSON error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) if !e.error.is_empty() => e.error,
        _ => body.to_string(),
    }
}
