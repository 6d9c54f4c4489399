//! LLM request/response types
//!
//! Provider-neutral: each client translates these to and from its own wire
//! format.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversation::Turn;

/// A completion request - everything needed for one round-trip
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Full conversation so far, system turns included
    pub turns: Vec<Turn>,

    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,

    /// Max tokens for response (from config)
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Text of every system turn, joined by blank lines
    ///
    /// Both providers take the system prompt outside the message list.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::System { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if parts.is_empty() { None } else { Some(parts.join("\n\n")) }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Tool calls requested by the model, in the order the model issued them
    pub tool_calls: Vec<ToolCall>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for this round-trip
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A plain text answer with no tool calls
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// A response that only requests tool calls
    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }

    /// True when the model produced neither text nor calls
    ///
    /// Any text counts as an answer, even whitespace.
    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_empty() && self.content.is_none()
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => StopReason::Other,
        }
    }

    /// Parse from Gemini finishReason; Gemini reports STOP even when it calls functions
    pub fn from_gemini(s: &str, has_calls: bool) -> Self {
        debug!(%s, %has_calls, "StopReason::from_gemini: called");
        match s {
            "STOP" if has_calls => StopReason::ToolUse,
            "STOP" => StopReason::EndTurn,
            "MAX_TOKENS" => StopReason::MaxTokens,
            _ => StopReason::Other,
        }
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u64,
    /// Response tokens
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another round-trip's usage
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Tool definition for the LLM
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: serde_json::Value) -> Self {
        let name = name.into();
        let description = description.into();
        debug!(%name, "ToolDefinition::new: called");
        Self {
            name,
            description,
            input_schema,
        }
    }

    /// Convert to Anthropic API schema format
    pub fn to_anthropic_schema(&self) -> serde_json::Value {
        debug!(%self.name, "ToolDefinition::to_anthropic_schema: called");
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }

    /// Convert to a Gemini function declaration
    ///
    /// Gemini's schema dialect spells types in upper case (`OBJECT`, `STRING`).
    pub fn to_gemini_declaration(&self) -> serde_json::Value {
        debug!(%self.name, "ToolDefinition::to_gemini_declaration: called");
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": gemini_schema(&self.input_schema),
        })
    }
}

fn gemini_schema(schema: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| match (key.as_str(), value) {
                    ("type", Value::String(t)) => (key.clone(), Value::String(t.to_uppercase())),
                    // property names are user keys, not schema keywords
                    ("properties", Value::Object(props)) => (
                        key.clone(),
                        Value::Object(props.iter().map(|(k, v)| (k.clone(), gemini_schema(v))).collect()),
                    ),
                    _ => (key.clone(), gemini_schema(value)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(gemini_schema).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "type": { "type": "string" },
                "args": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["type"]
        })
    }

    #[test]
    fn test_stop_reason_from_anthropic() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_anthropic("stop_sequence"), StopReason::StopSequence);
        assert_eq!(StopReason::from_anthropic("unknown"), StopReason::Other);
    }

    #[test]
    fn test_stop_reason_from_gemini() {
        assert_eq!(StopReason::from_gemini("STOP", false), StopReason::EndTurn);
        assert_eq!(StopReason::from_gemini("STOP", true), StopReason::ToolUse);
        assert_eq!(StopReason::from_gemini("MAX_TOKENS", false), StopReason::MaxTokens);
        assert_eq!(StopReason::from_gemini("SAFETY", false), StopReason::Other);
    }

    #[test]
    fn test_token_usage_add() {
        let mut total = TokenUsage::default();
        total.add(&TokenUsage {
            input_tokens: 10,
            output_tokens: 3,
        });
        total.add(&TokenUsage {
            input_tokens: 25,
            output_tokens: 4,
        });
        assert_eq!(total.input_tokens, 35);
        assert_eq!(total.output_tokens, 7);
    }

    #[test]
    fn test_system_text_joins_system_turns() {
        let request = CompletionRequest {
            turns: vec![
                Turn::System { text: "be careful".into() },
                Turn::User { text: "hi".into() },
                Turn::System { text: "be brief".into() },
            ],
            tools: vec![],
            max_tokens: 100,
        };
        assert_eq!(request.system_text().as_deref(), Some("be careful\n\nbe brief"));

        let request = CompletionRequest {
            turns: vec![Turn::User { text: "hi".into() }],
            tools: vec![],
            max_tokens: 100,
        };
        assert!(request.system_text().is_none());
    }

    #[test]
    fn test_empty_response() {
        assert!(CompletionResponse::calls(vec![]).is_empty());
        assert!(!CompletionResponse::text("  \n").is_empty());
        assert!(!CompletionResponse::text("done").is_empty());
        assert!(!CompletionResponse::calls(vec![ToolCall::new("1", "read_file", serde_json::json!({}))]).is_empty());
    }

    #[test]
    fn test_tool_definition_to_anthropic_schema() {
        let tool = ToolDefinition::new("read_file", "Read a file", schema());

        let schema = tool.to_anthropic_schema();
        assert_eq!(schema["name"], "read_file");
        assert_eq!(schema["description"], "Read a file");
        assert_eq!(schema["input_schema"]["type"], "object");
    }

    #[test]
    fn test_tool_definition_to_gemini_declaration() {
        let tool = ToolDefinition::new("run_script", "Run a script", schema());

        let decl = tool.to_gemini_declaration();
        assert_eq!(decl["name"], "run_script");
        assert_eq!(decl["parameters"]["type"], "OBJECT");
        assert_eq!(decl["parameters"]["properties"]["type"]["type"], "STRING");
        assert_eq!(decl["parameters"]["properties"]["args"]["items"]["type"], "STRING");
        assert_eq!(decl["parameters"]["required"][0], "type");
    }
}
