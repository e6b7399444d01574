use thiserror::Error;

/// Failure of a single round trip to the completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request could not be completed (connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// Any status other than 200, with the first 200 characters of the body.
    #[error("HTTP {code}: {body}")]
    HttpStatus { code: u16, body: String },

    /// Status 200 but the body is not JSON.
    #[error("JSON decode error: {0}")]
    Malformed(String),

    /// Status 200 with an empty or whitespace-only body.
    #[error("Empty response from API")]
    EmptyBody,
}

/// Errors surfaced by the tools, always rendered as `ERROR: ...` text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Invalid model. Choose from: {choices}")]
    InvalidModel { choices: String },

    #[error("Invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Request failed: {0}")]
    Api(#[from] ApiError),
}

pub type Result<T> = std::result::Result<T, ToolError>;
