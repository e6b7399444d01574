//! Request and response types for the completions API.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Answer text used when the payload carries no usable message content.
pub const NO_RESPONSE: &str = "No response";

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of a `POST /chat/completions` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

/// The parts of a successful payload that get rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub answer: String,
    pub citations: Vec<String>,
}

impl CompletionResponse {
    /// Decode a raw payload, falling back to placeholders for anything missing.
    ///
    /// Never fails: a payload of the wrong shape yields [`NO_RESPONSE`] and
    /// no citations.
    pub fn from_json(value: Value) -> Self {
        // Derived structs also accept arrays by position; only objects count.
        if !value.is_object() {
            warn!("response payload is not a JSON object");
            return Self {
                answer: NO_RESPONSE.to_string(),
                citations: Vec::new(),
            };
        }

        let payload: ApiResponse = serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("unexpected response shape: {e}");
            ApiResponse::default()
        });

        let answer = payload
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| NO_RESPONSE.to_string());

        let citations = payload
            .citations
            .unwrap_or_default()
            .into_iter()
            .map(|citation| match citation {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        Self { answer, citations }
    }
}

// --- Wire format ---
//
// Every field is optional and decoded independently, so one malformed field
// does not discard the rest of the payload.

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default, deserialize_with = "lenient")]
    choices: Option<Vec<ApiChoice>>,
    #[serde(default, deserialize_with = "lenient")]
    citations: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default, deserialize_with = "lenient")]
    message: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default, deserialize_with = "lenient")]
    content: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
