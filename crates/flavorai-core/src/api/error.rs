use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success status. `message` is ready to show to the user.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Status {
            status: status.as_u16(),
            message: Self::message_from_body(status.as_u16(), body),
        }
    }

    /// Pull the user-facing message out of an error body.
    ///
    /// `{"message": "x"}` gives `x`, `{"message": ["a", "b"]}` gives `a, b`.
    /// Anything else falls back to "Request failed with status <code>".
    pub fn message_from_body(status: u16, body: &str) -> String {
        let fallback = || format!("Request failed with status {}", status);

        let message = match serde_json::from_str::<Value>(body) {
            Ok(data) => data.get("message").cloned(),
            Err(_) => None,
        };

        let text = match message {
            Some(Value::String(s)) => s,
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        if text.is_empty() {
            fallback()
        } else {
            text
        }
    }

    /// HTTP status of the failed request, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server rejected the credential (or none was sent).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
