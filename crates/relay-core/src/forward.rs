//! The per-message forward operation.

use relay_types::jsonrpc::method_of;
use relay_types::{ErrorEnvelope, ForwardError};

use crate::endpoint::Endpoint;

/// Result of forwarding one inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The remote response, re-serialized as a single JSON line.
    Response(String),
    /// A locally synthesized JSON-RPC error.
    Error(ErrorEnvelope),
}

/// Forward one inbound line to `endpoint`.
///
/// The line must be UTF-8 JSON, otherwise the endpoint is never contacted.
/// The parsed value is re-serialized and POSTed once; the response body must
/// also parse as JSON. Every failure becomes an [`Outcome::Error`].
pub async fn forward(endpoint: &dyn Endpoint, line: &[u8]) -> Outcome {
    match try_forward(endpoint, line).await {
        Ok(response) => Outcome::Response(response),
        Err(err) => {
            tracing::debug!(
                reached_endpoint = err.reached_endpoint(),
                "Forward to {} failed: {err}",
                endpoint.target()
            );
            Outcome::Error(ErrorEnvelope::from(&err))
        }
    }
}

async fn try_forward(endpoint: &dyn Endpoint, line: &[u8]) -> Result<String, ForwardError> {
    let message: serde_json::Value =
        serde_json::from_slice(line).map_err(ForwardError::InvalidRequest)?;
    let body = serde_json::to_string(&message).map_err(ForwardError::InvalidRequest)?;

    tracing::debug!(
        method = method_of(&message).unwrap_or("-"),
        "Forwarding message to {}",
        endpoint.target()
    );

    let response = endpoint.post(body).await?;

    let reply: serde_json::Value =
        serde_json::from_str(&response).map_err(ForwardError::InvalidResponse)?;
    serde_json::to_string(&reply).map_err(ForwardError::InvalidResponse)
}
