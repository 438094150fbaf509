use crate::api::ApiError;

/// Human-readable text for a failed request, suitable for a status line.
pub fn message_for(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized { detail } => match detail {
            Some(d) => d.clone(),
            None => "Please sign in to continue.".to_string(),
        },
        ApiError::NotFound { .. } => "The requested item was not found.".to_string(),
        ApiError::Conflict { detail } => detail
            .clone()
            .unwrap_or_else(|| "That already exists.".to_string()),
        ApiError::ValidationFailed { detail, .. } => match detail {
            Some(d) => format!("Invalid input: {d}"),
            None => "Invalid input.".to_string(),
        },
        ApiError::Transport(reason) => {
            format!("Could not reach the server ({reason}). Check your connection and retry.")
        }
        ApiError::ServerError { status, .. } => {
            format!("The server ran into a problem (HTTP {status}). Try again later.")
        }
        ApiError::UnexpectedStatus { status, detail } => match detail {
            Some(d) => format!("Unexpected response (HTTP {status}): {d}"),
            None => format!("Unexpected response (HTTP {status})."),
        },
        ApiError::InvalidResponse(_) => {
            "The server sent a response that could not be read.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_prefers_backend_detail() {
        let err = ApiError::Unauthorized {
            detail: Some("Incorrect email or password".into()),
        };
        assert_eq!(message_for(&err), "Incorrect email or password");
        assert_eq!(
            message_for(&ApiError::Unauthorized { detail: None }),
            "Please sign in to continue."
        );
    }

    #[test]
    fn test_transport_names_the_cause() {
        let msg = message_for(&ApiError::Transport("request timed out after 30s".into()));
        assert!(msg.contains("timed out after 30s"));
        assert!(msg.contains("retry"));
    }

    #[test]
    fn test_server_error_hides_detail() {
        let err = ApiError::ServerError {
            status: 500,
            detail: Some("Traceback ...".into()),
        };
        let msg = message_for(&err);
        assert!(msg.contains("500"));
        assert!(!msg.contains("Traceback"));
    }

    #[test]
    fn test_validation_includes_detail() {
        let err = ApiError::ValidationFailed {
            status: 422,
            detail: Some("email: value is not a valid email address".into()),
        };
        assert_eq!(
            message_for(&err),
            "Invalid input: email: value is not a valid email address"
        );
    }
}
