//! The `perplexity_ask` and `list_models` tools.
//!
//! Both tools return text. Failures are rendered as `ERROR: ...` strings
//! rather than raised, so the host always has something to display.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use mcp::{CallToolResult, Tool, ToolHandler};

use crate::client::Completions;
use crate::error::{Result, ToolError};
use crate::format::{format_answer, format_model_list};
use crate::models::{self, DEFAULT_MODEL};
use crate::types::{ChatMessage, CompletionRequest, CompletionResponse};

pub const ASK_TOOL: &str = "perplexity_ask";
pub const LIST_MODELS_TOOL: &str = "list_models";

/// Prefix of every failure string.
pub const ERROR_PREFIX: &str = "ERROR:";

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TOP_P: f64 = 1.0;

/// Arguments of `perplexity_ask`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskParams {
    pub question: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Optional system prompt; empty means none.
    #[serde(default)]
    pub system_message: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f64 {
    DEFAULT_TOP_P
}

impl AskParams {
    /// A question with every other argument at its default.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            model: default_model(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            system_message: String::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if !models::is_valid(&self.model) {
            return Err(ToolError::InvalidModel {
                choices: models::model_ids(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ToolError::InvalidArgument {
                name: "max_tokens",
                reason: "must be a positive integer".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ToolError::InvalidArgument {
                name: "temperature",
                reason: format!("{} is outside 0.0-2.0", self.temperature),
            });
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ToolError::InvalidArgument {
                name: "top_p",
                reason: format!("{} is outside (0.0, 1.0]", self.top_p),
            });
        }
        Ok(())
    }

    fn to_request(&self) -> CompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if !self.system_message.is_empty() {
            messages.push(ChatMessage::system(&self.system_message));
        }
        messages.push(ChatMessage::user(&self.question));

        CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }
}

/// Tool layer over a completions backend.
pub struct SonarTools<C> {
    client: C,
}

impl<C: Completions> SonarTools<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Ask a question. Never fails: errors come back as `ERROR: ...` text.
    pub async fn ask(&self, params: AskParams) -> String {
        match self.try_ask(&params).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(model = %params.model, "ask failed: {e}");
                error_text(&e)
            }
        }
    }

    async fn try_ask(&self, params: &AskParams) -> Result<String> {
        params.validate()?;

        let raw = self.client.send(&params.to_request()).await?;
        let response = CompletionResponse::from_json(raw);

        Ok(format_answer(&params.model, &response))
    }

    pub fn list_models(&self) -> String {
        format_model_list(models::list_models())
    }
}

impl<C: Completions + 'static> ToolHandler for SonarTools<C> {
    fn tools(&self) -> Vec<Tool> {
        vec![ask_tool(), list_models_tool()]
    }

    async fn call(&self, name: &str, arguments: Value) -> mcp::Result<CallToolResult> {
        let text = match name {
            ASK_TOOL => match serde_json::from_value::<AskParams>(arguments) {
                Ok(params) => self.ask(params).await,
                Err(e) => error_text(&ToolError::InvalidArguments(e.to_string())),
            },
            LIST_MODELS_TOOL => self.list_models(),
            other => return Err(mcp::Error::ToolNotFound(other.to_string())),
        };

        let is_error = text.starts_with(ERROR_PREFIX);
        Ok(CallToolResult::text(text, is_error))
    }
}

fn error_text(err: &ToolError) -> String {
    format!("{ERROR_PREFIX} {err}")
}

fn ask_tool() -> Tool {
    let models = models::model_ids();
    Tool {
        name: ASK_TOOL.to_string(),
        description: Some(
            "Ask Perplexity AI a question. Returns the answer with its sources.".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "Your question"
                },
                "model": {
                    "type": "string",
                    "description": format!("Model to use ({models})"),
                    "default": DEFAULT_MODEL
                },
                "max_tokens": {
                    "type": "integer",
                    "description": "Max tokens in response",
                    "minimum": 1,
                    "default": DEFAULT_MAX_TOKENS
                },
                "temperature": {
                    "type": "number",
                    "description": "Creativity control 0.0-2.0 (lower=focused, higher=creative)",
                    "minimum": 0.0,
                    "maximum": 2.0,
                    "default": DEFAULT_TEMPERATURE
                },
                "top_p": {
                    "type": "number",
                    "description": "Nucleus sampling (0.0, 1.0] (lower=more focused)",
                    "exclusiveMinimum": 0.0,
                    "maximum": 1.0,
                    "default": DEFAULT_TOP_P
                },
                "system_message": {
                    "type": "string",
                    "description": "System prompt to guide AI behavior (optional)",
                    "default": ""
                }
            },
            "required": ["question"]
        }),
    }
}

fn list_models_tool() -> Tool {
    Tool {
        name: LIST_MODELS_TOOL.to_string(),
        description: Some("List all available Perplexity models".to_string()),
        input_schema: json!({"type": "object", "properties": {}}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::Mutex;

    /// Records requests and replays a canned result.
    struct Canned {
        reply: std::result::Result<Value, ApiError>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Canned {
        fn new(reply: std::result::Result<Value, ApiError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Completions for Canned {
        async fn send(
            &self,
            request: &CompletionRequest,
        ) -> std::result::Result<Value, ApiError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn answer(content: &str) -> Value {
        json!({"choices": [{"message": {"content": content}}], "citations": []})
    }

    #[tokio::test]
    async fn ask_builds_request_with_system_first() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let params = AskParams::new("Why?").with_system_message("Be terse.");
        tools.ask(params).await;

        let seen = tools.client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].messages,
            vec![ChatMessage::system("Be terse."), ChatMessage::user("Why?")]
        );
        assert_eq!(seen[0].model, "sonar");
        assert_eq!(seen[0].max_tokens, 1000);
    }

    #[tokio::test]
    async fn empty_system_message_is_omitted() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        tools.ask(AskParams::new("Why?")).await;
        let seen = tools.client.seen.lock().unwrap();
        assert_eq!(seen[0].messages, vec![ChatMessage::user("Why?")]);
    }

    #[tokio::test]
    async fn invalid_model_lists_choices_without_sending() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let out = tools.ask(AskParams::new("q").with_model("gpt-4")).await;

        assert!(out.starts_with("ERROR:"));
        for entry in models::list_models() {
            assert!(out.contains(entry.id), "missing {}", entry.id);
        }
        assert!(tools.client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_sampling_is_rejected() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let cases = [
            AskParams {
                max_tokens: 0,
                ..AskParams::new("q")
            },
            AskParams {
                temperature: 2.5,
                ..AskParams::new("q")
            },
            AskParams {
                temperature: f64::NAN,
                ..AskParams::new("q")
            },
            AskParams {
                top_p: 0.0,
                ..AskParams::new("q")
            },
            AskParams {
                top_p: 1.5,
                ..AskParams::new("q")
            },
        ];
        for params in cases {
            let out = tools.ask(params.clone()).await;
            assert!(out.starts_with("ERROR: Invalid "), "{params:?} gave {out}");
        }
        assert!(tools.client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn boundary_sampling_values_are_accepted() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let params = AskParams {
            temperature: 2.0,
            top_p: 1.0,
            max_tokens: 1,
            ..AskParams::new("q")
        };
        assert!(tools.ask(params).await.starts_with("ANSWER (sonar):"));
        let params = AskParams {
            temperature: 0.0,
            top_p: 0.01,
            ..AskParams::new("q")
        };
        assert!(tools.ask(params).await.starts_with("ANSWER (sonar):"));
    }

    #[tokio::test]
    async fn api_errors_become_error_text() {
        let tools = SonarTools::new(Canned::new(Err(ApiError::HttpStatus {
            code: 401,
            body: "Unauthorized".to_string(),
        })));
        let out = tools.ask(AskParams::new("q")).await;
        assert_eq!(out, "ERROR: Request failed: HTTP 401: Unauthorized");

        let tools = SonarTools::new(Canned::new(Err(ApiError::EmptyBody)));
        let out = tools.ask(AskParams::new("q")).await;
        assert_eq!(out, "ERROR: Request failed: Empty response from API");
    }

    #[tokio::test]
    async fn every_model_appears_in_header() {
        for entry in models::list_models() {
            let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
            let out = tools.ask(AskParams::new("q").with_model(entry.id)).await;
            assert!(out.starts_with(&format!("ANSWER ({}):", entry.id)));
        }
    }

    #[tokio::test]
    async fn call_decodes_arguments_with_defaults() {
        let tools = SonarTools::new(Canned::new(Ok(answer("4"))));
        let result = tools
            .call(ASK_TOOL, json!({"question": "What is 2+2?"}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(
            result.content[0].as_text(),
            Some("ANSWER (sonar):\n============================================================\n4\n")
        );

        let seen = tools.client.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].top_p, 1.0);
    }

    #[tokio::test]
    async fn call_with_bad_arguments_is_error_text() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let result = tools.call(ASK_TOOL, json!({"model": "sonar"})).await.unwrap();
        assert!(result.is_error);
        let text = result.content[0].as_text().unwrap();
        assert!(text.starts_with("ERROR: Invalid arguments:"));
        assert!(text.contains("question"));

        let result = tools
            .call(ASK_TOOL, json!({"question": "q", "max_tokens": -5}))
            .await
            .unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn call_marks_failures() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let result = tools
            .call(ASK_TOOL, json!({"question": "q", "model": "bogus"}))
            .await
            .unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn call_list_models_ignores_arguments() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let result = tools.call(LIST_MODELS_TOOL, Value::Null).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content[0].as_text(), Some(tools.list_models().as_str()));
    }

    #[tokio::test]
    async fn call_unknown_tool_fails() {
        let tools = SonarTools::new(Canned::new(Ok(answer("ok"))));
        let err = tools.call("search", json!({})).await.unwrap_err();
        assert!(matches!(err, mcp::Error::ToolNotFound(name) if name == "search"));
    }

    #[test]
    fn tool_definitions() {
        let tools = SonarTools::new(Canned::new(Ok(Value::Null)));
        let defs = tools.tools();
        let names: Vec<_> = defs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, [ASK_TOOL, LIST_MODELS_TOOL]);

        let schema = &defs[0].input_schema;
        assert_eq!(schema["required"], json!(["question"]));
        assert_eq!(schema["properties"]["model"]["default"], "sonar");
        // Unknown models must reach the tool so it can list the valid ones.
        assert!(schema["properties"]["model"].get("enum").is_none());
        let description = schema["properties"]["model"]["description"].as_str().unwrap();
        for entry in models::list_models() {
            assert!(description.contains(entry.id));
        }
    }
}
