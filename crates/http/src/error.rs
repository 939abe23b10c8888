//! Structured HTTP errors.

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// A response outside the accepted status range, normalized with the
    /// request context and a best-effort message from the body.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        url: String,
        method: String,
        headers: HashMap<String, String>,
        body: Option<Value>,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl HttpError {
    pub fn status(
        status: u16,
        headers: HashMap<String, String>,
        body: Option<Value>,
        url: String,
        method: String,
    ) -> Self {
        let message = body
            .as_ref()
            .and_then(body_message)
            .unwrap_or_else(|| format!("HTTP {status}"));
        HttpError::Status { status, message, url, method, headers, body }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(err) => err.status().map(|s| s.as_u16()),
            HttpError::InvalidResponse(_) => None,
        }
    }
}

/// Best-effort human message from an error body: `message`, then
/// `error`, then `title`.
pub fn body_message(body: &Value) -> Option<String> {
    for key in ["message", "error", "title"] {
        if let Some(text) = body.get(key).and_then(|v| v.as_str()) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_extraction_prefers_message_then_error_then_title() {
        assert_eq!(
            body_message(&json!({"message": "nope", "error": "other"})),
            Some("nope".to_string())
        );
        assert_eq!(body_message(&json!({"error": "broken"})), Some("broken".to_string()));
        assert_eq!(body_message(&json!({"title": "Conflict"})), Some("Conflict".to_string()));
        assert_eq!(body_message(&json!({"detail": "x"})), None);
    }

    #[test]
    fn status_error_falls_back_to_http_code() {
        let err = HttpError::status(503, HashMap::new(), None, "u".into(), "GET".into());
        assert_eq!(err.to_string(), "HTTP 503");
        assert_eq!(err.status_code(), Some(503));
    }
}
