use thiserror::Error;

use crate::tasks::Surface;

/// Failures talking to the knowledge-base service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request never produced an HTTP response (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with a non-success status.
    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    /// Entity lookup returned 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected envelope.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message suitable for showing in a status line.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Network(_) => "Could not reach the knowledge-base service".to_string(),
            GatewayError::Backend { message, .. } => message.clone(),
            GatewayError::NotFound(what) => format!("{what} not found"),
            GatewayError::Decode(_) => "Unexpected response from the knowledge-base service".to_string(),
        }
    }
}

/// Failures from the task trigger coordinator.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("A {} request is already in flight", .0.label())]
    Busy(Surface),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
