//! Perplexity Sonar search exposed as MCP tools.
//!
//! This crate wraps the Perplexity chat completions API in two tools an
//! agent host can call: `perplexity_ask` and `list_models`.
//!
//! # Overview
//!
//! - **models**: The static registry of Sonar model tiers.
//! - **client**: [`HttpClient`] performs one `POST /chat/completions` per call
//!   and classifies failures as [`ApiError`].
//! - **format**: Renders answers and citations as plain text.
//! - **tools**: [`SonarTools`] validates arguments, drives the client and
//!   formats the result. It implements [`mcp::ToolHandler`].
//!
//! # Example
//!
//! ```no_run
//! use perplexity::{AskParams, ClientConfig, HttpClient, SonarTools};
//!
//! # async fn example() -> Result<(), perplexity::ApiError> {
//! let client = HttpClient::new(ClientConfig::new("pplx-..."))?;
//! let tools = SonarTools::new(client);
//!
//! let answer = tools.ask(AskParams::new("What is 2+2?")).await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod client;
mod error;
pub mod format;
pub mod models;
mod tools;
mod types;

pub use client::{ClientConfig, Completions, DEFAULT_BASE_URL, HttpClient, redact};
pub use error::{ApiError, Result, ToolError};
pub use format::{MAX_CITATIONS, format_answer, format_model_list};
pub use models::{DEFAULT_MODEL, ModelEntry};
pub use tools::{ASK_TOOL, AskParams, ERROR_PREFIX, LIST_MODELS_TOOL, SonarTools};
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, NO_RESPONSE, Role};
