//! Error hierarchy for mcp-relay.

use thiserror::Error;

use crate::jsonrpc::INTERNAL_ERROR;

/// Process-level errors. Any of these ends the relay run.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("Forward task failed: {0}")]
    Task(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors scoped to a single forwarded message.
///
/// These never end the run: each one becomes an error envelope for the
/// message that caused it and the relay keeps reading.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Invalid JSON in request: {0}")]
    InvalidRequest(serde_json::Error),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request failed: timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(serde_json::Error),
}

impl ForwardError {
    /// JSON-RPC error code reported for this failure.
    ///
    /// Every per-message failure is reported as an internal error; the message
    /// text is what tells them apart.
    pub fn code(&self) -> i64 {
        INTERNAL_ERROR
    }

    /// Whether the remote endpoint was contacted before the failure.
    pub fn reached_endpoint(&self) -> bool {
        !matches!(self, ForwardError::InvalidRequest(_))
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
