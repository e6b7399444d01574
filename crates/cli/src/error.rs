//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A config file was named on the command line but does not exist.
    #[error("config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be set up.
    #[error(transparent)]
    Api(#[from] perplexity::ApiError),

    /// The MCP server loop failed.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
