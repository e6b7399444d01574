//! HTTP client for the chat completions endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{error, info};

use crate::error::ApiError;
use crate::types::CompletionRequest;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Characters of an error body carried in [`ApiError::HttpStatus`].
const STATUS_BODY_CHARS: usize = 200;

/// Characters of a failed body written to the log.
const LOG_BODY_CHARS: usize = 500;

/// Connection settings, resolved once at startup.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Overall request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full URL of the completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{COMPLETIONS_PATH}", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Shorten a secret for logging: the first 10 characters, then `...`.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(10).collect();
    format!("{prefix}...")
}

/// Trait for completion backends.
///
/// [`HttpClient`] is the real implementation; tests can substitute their own.
pub trait Completions: Send + Sync {
    /// Perform one round trip and return the parsed JSON payload.
    fn send(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// reqwest-backed completions client.
pub struct HttpClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Transport(error_chain(&e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Completions for HttpClient {
    async fn send(&self, request: &CompletionRequest) -> Result<Value, ApiError> {
        info!(endpoint = %self.endpoint, model = %request.model, "sending completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&self.endpoint, &e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.endpoint, &e))?;

        info!(status, bytes = body.len(), "received response");

        classify(status, &body)
    }
}

/// Turn a received status and body into a payload or an error.
///
/// The status is checked before parsing: error bodies need not be JSON.
/// Only 200 counts as success.
fn classify(status: u16, body: &str) -> Result<Value, ApiError> {
    let body = body.trim();

    if status != 200 {
        error!(status, body = %truncate(body, LOG_BODY_CHARS), "non-200 response");
        return Err(ApiError::HttpStatus {
            code: status,
            body: truncate(body, STATUS_BODY_CHARS),
        });
    }

    if body.is_empty() {
        error!("empty response body");
        return Err(ApiError::EmptyBody);
    }

    serde_json::from_str(body).map_err(|e| {
        error!(body = %truncate(body, LOG_BODY_CHARS), "JSON decode error: {e}");
        ApiError::Malformed(e.to_string())
    })
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> ApiError {
    let detail = error_chain(err);
    error!(endpoint, "request failed: {detail}");
    ApiError::Transport(detail)
}

/// Render an error with its sources, e.g. `error sending request: Connection refused`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause = cause.to_string();
        if !detail.contains(&cause) {
            detail.push_str(": ");
            detail.push_str(&cause);
        }
        source = source.and_then(|s| s.source());
    }
    detail
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
