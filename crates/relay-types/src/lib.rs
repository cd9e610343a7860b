//! Shared error hierarchy and JSON-RPC envelope types for mcp-relay.

pub mod error;
pub mod jsonrpc;

pub use error::{ConfigError, ForwardError, RelayError};
pub use jsonrpc::{ErrorEnvelope, ErrorObject, INTERNAL_ERROR, JSONRPC_VERSION};
