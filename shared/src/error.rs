use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response reached us (connect refused, DNS, reset...).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// 2xx with a body we could not read.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// Build the HTTP variant from a status and the raw response body,
    /// preferring the backend's own wording.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = backend_message(body)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
        ApiError::Http { status, message }
    }

    /// The one-line text shown to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e)
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn backend_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
