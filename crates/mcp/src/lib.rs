//! MCP (Model Context Protocol) server library.
//!
//! This crate serves tools to an agent host over newline-delimited JSON-RPC
//! on stdio. It answers `initialize`, `ping`, `tools/list` and `tools/call`,
//! and honours `notifications/cancelled` by aborting the matching call.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, Server, ServerInfo, Tool, ToolHandler};
//! use serde_json::Value;
//!
//! struct Hello;
//!
//! impl ToolHandler for Hello {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool {
//!             name: "hello".to_string(),
//!             description: Some("Say hello".to_string()),
//!             input_schema: serde_json::json!({"type": "object"}),
//!         }]
//!     }
//!
//!     async fn call(&self, _name: &str, _arguments: Value) -> mcp::Result<CallToolResult> {
//!         Ok(CallToolResult::text("hello", false))
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! Server::new(ServerInfo::new("hello", "0.1.0"), Hello)
//!     .serve_stdio()
//!     .await
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, CancelledParams, ClientInfo, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo, Tool, ToolContent,
    ToolsCapability,
};
pub use server::{Server, ToolHandler};
