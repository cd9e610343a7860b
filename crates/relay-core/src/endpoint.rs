//! Remote endpoint abstraction and its reqwest-backed implementation.

use std::error::Error as _;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use relay_types::{ForwardError, RelayError};
use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

/// Boxed future returned by [`Endpoint::post`].
pub type PostFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ForwardError>> + Send + 'a>>;

/// A remote JSON-RPC endpoint that accepts one message per POST.
pub trait Endpoint: Send + Sync {
    /// POST a serialized JSON body and resolve to the full response body.
    fn post(&self, body: String) -> PostFuture<'_>;

    /// Human-readable target, used in logs.
    fn target(&self) -> &str;
}

/// HTTP/HTTPS endpoint backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpEndpoint {
    http: reqwest::Client,
    url: Url,
    timeout_ms: Option<u64>,
}

impl HttpEndpoint {
    /// Create an endpoint for `url`. With `timeout_ms` set, each POST
    /// (connect through full body) is bounded by that duration.
    pub fn new(url: Url, timeout_ms: Option<u64>) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;

        Ok(Self {
            http,
            url,
            timeout_ms,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn classify(&self, err: reqwest::Error) -> ForwardError {
        match self.timeout_ms {
            Some(timeout_ms) if err.is_timeout() => ForwardError::Timeout { timeout_ms },
            _ => ForwardError::Transport(error_chain(&err)),
        }
    }
}

impl Endpoint for HttpEndpoint {
    fn post(&self, body: String) -> PostFuture<'_> {
        Box::pin(async move {
            tracing::debug!("POST {} ({} bytes)", self.url, body.len());

            // reqwest sets Content-Length from the String body.
            let response = self
                .http
                .post(self.url.clone())
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body)
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = response.status();
            if !status.is_success() {
                tracing::warn!("Remote endpoint {} answered {status}", self.url);
            }

            response.text().await.map_err(|e| self.classify(e))
        })
    }

    fn target(&self) -> &str {
        self.url.as_str()
    }
}

/// Render an error with its source chain, e.g.
/// `error sending request for url (..): client error (Connect): connection refused`.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
