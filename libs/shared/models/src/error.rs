use std::time::Duration;

use thiserror::Error;

/// Shown in the chat whenever the triage backend cannot be reached.
pub const CONNECTION_FAILURE_MESSAGE: &str = "Unable to contact server. Please try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short string suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::Server { message, .. } => message.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Transport(_) | AppError::Timeout(_) => {
                CONNECTION_FAILURE_MESSAGE.to_string()
            }
            AppError::Cancelled => "Request cancelled".to_string(),
            AppError::Protocol(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Timeout(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_is_shown_verbatim() {
        let err = AppError::Server {
            status: 401,
            message: "Invalid password".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid password");
        assert_eq!(err.to_string(), "Server error (401): Invalid password");
    }

    #[test]
    fn test_transport_failures_share_fallback_message() {
        let transport = AppError::Transport("connection refused".to_string());
        let timeout = AppError::Timeout(Duration::from_secs(60));

        assert_eq!(transport.user_message(), CONNECTION_FAILURE_MESSAGE);
        assert_eq!(timeout.user_message(), CONNECTION_FAILURE_MESSAGE);
        assert_eq!(timeout.to_string(), "Request timed out after 60s");
        assert!(transport.is_transport());
        assert!(!AppError::Cancelled.is_transport());
    }
}
