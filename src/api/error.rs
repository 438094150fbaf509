use std::time::Duration;
use thiserror::Error;

/// Longest raw (non-JSON) error body carried into an error message.
const MAX_RAW_DETAIL: usize = 200;

/// Failure of a backend call, classified by what the caller can do about it.
///
/// The gateway never renders these; `view::message_for` maps them to text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 401: missing, expired or revoked credential (or bad login).
    #[error("Unauthorized{}", suffix(.detail))]
    Unauthorized { detail: Option<String> },

    /// 404
    #[error("Not found{}", suffix(.detail))]
    NotFound { detail: Option<String> },

    /// 409, e.g. registering an email that already exists.
    #[error("Conflict{}", suffix(.detail))]
    Conflict { detail: Option<String> },

    /// 400 or 422: the backend rejected the input.
    #[error("Validation failed (HTTP {status}){}", suffix(.detail))]
    ValidationFailed { status: u16, detail: Option<String> },

    /// Connectivity failure or timeout. No response was received.
    #[error("Network error: {0}")]
    Transport(String),

    /// 5xx
    #[error("Server error (HTTP {status}){}", suffix(.detail))]
    ServerError { status: u16, detail: Option<String> },

    /// Any other non-success status (403, 429, ...).
    #[error("Unexpected status (HTTP {status}){}", suffix(.detail))]
    UnexpectedStatus { status: u16, detail: Option<String> },

    /// A success response whose body did not match the expected shape.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

fn suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            401 => Self::Unauthorized { detail },
            404 => Self::NotFound { detail },
            409 => Self::Conflict { detail },
            400 | 422 => Self::ValidationFailed { status, detail },
            500..=599 => Self::ServerError { status, detail },
            _ => Self::UnexpectedStatus { status, detail },
        }
    }

    /// Classify a reqwest failure. Timeouts and connection errors share the
    /// `Transport` shape and differ only in message.
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Transport(format!(
                "request timed out after {}s",
                timeout.as_secs_f32()
            ))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.is_connect() {
            Self::Transport(format!("could not connect: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::ValidationFailed { status, .. }
            | Self::ServerError { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    /// The backend's `detail` message, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { detail }
            | Self::NotFound { detail }
            | Self::Conflict { detail }
            | Self::ValidationFailed { detail, .. }
            | Self::ServerError { detail, .. }
            | Self::UnexpectedStatus { detail, .. } => detail.as_deref(),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Pull a human-readable message out of an error body.
///
/// Handles `{"detail": "..."}`, the request-validation form
/// `{"detail": [{"loc": [...], "msg": "..."}]}`, and falls back to a
/// truncated raw body for non-JSON responses.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        let raw: String = body.chars().take(MAX_RAW_DETAIL).collect();
        return Some(raw);
    };

    match json.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(|loc| loc.as_array())
                        .and_then(|loc| loc.last())
                        .and_then(|last| last.as_str());
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(ApiError::from_status(401, None), ApiError::Unauthorized { .. }));
        assert!(matches!(ApiError::from_status(404, None), ApiError::NotFound { .. }));
        assert!(matches!(ApiError::from_status(409, None), ApiError::Conflict { .. }));
        assert!(matches!(
            ApiError::from_status(422, None),
            ApiError::ValidationFailed { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(400, None),
            ApiError::ValidationFailed { status: 400, .. }
        ));
        assert!(matches!(
            ApiError::from_status(503, None),
            ApiError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            ApiError::from_status(403, None),
            ApiError::UnexpectedStatus { status: 403, .. }
        ));
    }

    #[test]
    fn test_status_and_detail_accessors() {
        let err = ApiError::from_status(409, Some("Email already registered".to_string()));
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.detail(), Some("Email already registered"));
        assert_eq!(err.to_string(), "Conflict: Email already registered");

        let err = ApiError::Transport("could not connect".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn test_extract_string_detail() {
        assert_eq!(
            extract_detail(r#"{"detail": "Article not found"}"#).as_deref(),
            Some("Article not found")
        );
    }

    #[test]
    fn test_extract_validation_detail() {
        let body = r#"{"detail": [
            {"loc": ["query", "page"], "msg": "ensure this value is greater than or equal to 1", "type": "value_error"},
            {"loc": ["body"], "msg": "field required", "type": "value_error.missing"}
        ]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("page: ensure this value is greater than or equal to 1; body: field required")
        );
    }

    #[test]
    fn test_extract_detail_edge_cases() {
        assert_eq!(extract_detail(""), None);
        assert_eq!(extract_detail(r#"{"error": "x"}"#), None);
        assert_eq!(extract_detail(r#"{"detail": null}"#), None);
        assert_eq!(extract_detail("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(extract_detail(&"x".repeat(500)).map(|d| d.len()), Some(200));
    }
}
