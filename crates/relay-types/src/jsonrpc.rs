//! JSON-RPC 2.0 envelopes synthesized by the relay.
//!
//! Inbound messages and remote responses are opaque `serde_json::Value`s; the
//! only envelope the relay builds itself is the error object it emits when a
//! message cannot be forwarded.

use std::fmt;

use serde::Serialize;

use crate::error::ForwardError;

/// The JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC "Internal error" code.
pub const INTERNAL_ERROR: i64 = -32603;

/// A JSON-RPC 2.0 error response with a null id.
///
/// Serializes as `{"jsonrpc":"2.0","error":{"code":..,"message":..},"id":null}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub jsonrpc: &'static str,
    pub error: ErrorObject,
    pub id: Option<serde_json::Value>,
}

/// The `error` member of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

impl ErrorEnvelope {
    /// Create an envelope with an explicit code.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: ErrorObject {
                code,
                message: message.into(),
            },
            id: None,
        }
    }

    /// Create an internal-error (-32603) envelope.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn code(&self) -> i64 {
        self.error.code
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }
}

impl From<&ForwardError> for ErrorEnvelope {
    fn from(err: &ForwardError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<ForwardError> for ErrorEnvelope {
    fn from(err: ForwardError) -> Self {
        Self::from(&err)
    }
}

/// Renders the envelope as a single compact JSON line (without the newline).
impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&line)
    }
}

/// Extract the `method` of a JSON-RPC message, if it has one.
pub fn method_of(message: &serde_json::Value) -> Option<&str> {
    message.get("method").and_then(|m| m.as_str())
}
