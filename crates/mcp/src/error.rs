//! MCP error types.

use crate::protocol::JsonRpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),
}

impl From<Error> for JsonRpcError {
    fn from(err: Error) -> Self {
        match err {
            Error::JsonRpc(e) => e,
            Error::InvalidParams(_) | Error::ToolNotFound(_) => {
                JsonRpcError::invalid_params(err.to_string())
            }
            other => JsonRpcError::internal_error(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
