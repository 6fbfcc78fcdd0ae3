//! Error types for the USSD engine.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Rejections of untrusted callback input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Invalid phone number format")]
    InvalidPhone,

    #[error("Invalid session id")]
    InvalidSessionId,

    #[error("Text too long: {length} > {max}")]
    TextTooLong { length: usize, max: usize },
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator call failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Transport error calling {operation}: {reason}")]
    Transport { operation: String, reason: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("{operation} failed with server status {status}")]
    Server { operation: String, status: u16 },

    #[error("{operation} rejected with client status {status}")]
    Client { operation: String, status: u16 },

    #[error("Failed to decode {operation} response: {reason}")]
    Decode { operation: String, reason: String },

    #[error("{operation} gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Whether another attempt could succeed.
    ///
    /// Connect failures, timeouts and 5xx responses are transient. Client
    /// errors (4xx) and undecodable bodies are definitive.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Server { .. }
        )
    }

    /// Classify a `reqwest` failure for `operation`.
    pub fn from_reqwest(operation: &str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: operation.to_string(),
                timeout,
            }
        } else if err.is_decode() {
            Self::Decode {
                operation: operation.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                operation: operation.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Classify a non-success HTTP status for `operation`.
    pub fn from_status(operation: &str, status: reqwest::StatusCode) -> Self {
        if status.is_client_error() {
            Self::Client {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Server {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
        }
    }
}
