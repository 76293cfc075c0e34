use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required - please log in again")]
    AuthenticationRequired,

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(#[source] reqwest::Error),

    #[error("{message}")]
    Application { status: StatusCode, message: String },

    #[error("Failed to decode JSON response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The three failure kinds a caller can be handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AuthenticationRequired,
    NetworkUnavailable,
    ApplicationError,
}

/// Maximum length for response bodies in log lines
const MAX_LOGGED_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Classify into the caller-facing taxonomy. Local faults (decoding,
    /// encoding, bad input, I/O) have no kind.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::AuthenticationRequired => Some(FailureKind::AuthenticationRequired),
            ApiError::NetworkUnavailable(_) => Some(FailureKind::NetworkUnavailable),
            ApiError::Application { .. } => Some(FailureKind::ApplicationError),
            _ => None,
        }
    }

    /// Build the failure for a non-success, non-401 response from its body.
    ///
    /// The message is the body's JSON `error` field, else its `message`
    /// field, else the raw body, else the status reason phrase.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::Application {
            status,
            message: extract_message(status, body),
        }
    }

    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_LOGGED_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_LOGGED_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}

fn extract_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["error", "message"] {
            if let Some(serde_json::Value::String(text)) = map.get(field) {
                return text.clone();
            }
        }
    }

    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
