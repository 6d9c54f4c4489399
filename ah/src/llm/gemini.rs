//! Google Gemini API client implementation
//!
//! Implements the LlmClient trait for the `generateContent` REST endpoint
//! with function calling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::http::post_json;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage, ToolCall};
use crate::config::LlmConfig;
use crate::conversation::Turn;

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    next_call_id: AtomicU64,
}

impl GeminiClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "GeminiClient::from_config: called");
        let api_key = config.get_api_key()?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url().to_string(),
            http,
            max_tokens: config.max_tokens,
            next_call_id: AtomicU64::new(1),
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        debug!(%self.model, %request.max_tokens, "GeminiClient::build_request_body: called");
        let mut body = json!({
            "contents": convert_turns(&request.turns),
            "generationConfig": {
                "maxOutputTokens": request.max_tokens.min(self.max_tokens),
            },
        });

        if let Some(system) = request.system_text() {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        if !request.tools.is_empty() {
            body["tools"] = json!([{
                "functionDeclarations": request
                    .tools
                    .iter()
                    .map(|t| t.to_gemini_declaration())
                    .collect::<Vec<_>>()
            }]);
        }

        body
    }

    /// Gemini does not always id its function calls; ids are synthesized per client
    fn call_id(&self, provided: Option<String>) -> String {
        provided
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("call_{}", self.next_call_id.fetch_add(1, Ordering::Relaxed)))
    }

    fn parse_response(&self, api_response: GeminiResponse) -> Result<CompletionResponse, LlmError> {
        debug!(candidates = api_response.candidates.len(), "GeminiClient::parse_response: called");
        let usage = api_response
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            let reason = api_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked: {}", r))
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(LlmError::EmptyResponse(reason));
        };

        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                texts.push(text);
            }
            if let Some(call) = part.function_call {
                let id = self.call_id(call.id);
                debug!(%id, name = %call.name, "GeminiClient::parse_response: function call");
                tool_calls.push(ToolCall::new(id, call.name, call.args));
            }
        }

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        Ok(CompletionResponse {
            content: if texts.is_empty() { None } else { Some(texts.join("")) },
            stop_reason: StopReason::from_gemini(&finish_reason, !tool_calls.is_empty()),
            tool_calls,
            usage,
        })
    }
}

/// Convert conversation turns to Gemini `contents`
///
/// System turns go to `systemInstruction`. Consecutive tool turns become one
/// content of `functionResponse` parts, answering the preceding model turn.
fn convert_turns(turns: &[Turn]) -> Vec<Value> {
    debug!(turn_count = %turns.len(), "gemini::convert_turns: called");
    let mut contents: Vec<Value> = Vec::new();
    let mut pending_responses: Vec<Value> = Vec::new();

    for turn in turns {
        if !matches!(turn, Turn::Tool { .. }) && !pending_responses.is_empty() {
            contents.push(json!({"role": "user", "parts": std::mem::take(&mut pending_responses)}));
        }

        match turn {
            Turn::System { .. } => {}
            Turn::User { text } => contents.push(json!({"role": "user", "parts": [{"text": text}]})),
            Turn::Model { text, calls } => {
                let mut parts = Vec::new();
                if let Some(text) = text
                    && !text.is_empty()
                {
                    parts.push(json!({"text": text}));
                }
                for call in calls {
                    parts.push(json!({"functionCall": {"name": call.name, "args": call.arguments}}));
                }
                contents.push(json!({"role": "model", "parts": parts}));
            }
            Turn::Tool { name, result, .. } => {
                let mut response = serde_json::Map::new();
                let key = if result.is_error { "error" } else { "result" };
                response.insert(key.to_string(), Value::String(result.content.clone()));
                pending_responses.push(json!({
                    "functionResponse": {
                        "name": name,
                        "response": response,
                    }
                }));
            }
        }
    }

    if !pending_responses.is_empty() {
        contents.push(json!({"role": "user", "parts": pending_responses}));
    }
    contents
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, turns = request.turns.len(), "GeminiClient::complete: called");
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request_body(&request);

        let response = post_json(
            &self.http,
            &url,
            &[
                ("x-goog-api-key", self.api_key.as_str()),
                ("content-type", "application/json"),
            ],
            &body,
        )
        .await?;

        let api_response: GeminiResponse = response.json().await?;
        self.parse_response(api_response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDefinition;
    use crate::tools::ToolResult;

    fn client() -> GeminiClient {
        GeminiClient {
            model: "gemini-2.0-flash-001".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens: 8192,
            next_call_id: AtomicU64::new(1),
        }
    }

    fn parse(raw: Value) -> Result<CompletionResponse, LlmError> {
        client().parse_response(serde_json::from_value(raw).unwrap())
    }

    #[test]
    fn test_build_request_body() {
        let request = CompletionRequest {
            turns: vec![
                Turn::System { text: "Be brief".into() },
                Turn::User { text: "What files?".into() },
            ],
            tools: vec![ToolDefinition::new(
                "list_directory",
                "List files",
                json!({"type": "object", "properties": {"directory": {"type": "string"}}}),
            )],
            max_tokens: 100_000,
        };

        let body = client().build_request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "What files?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        let decl = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(decl["name"], "list_directory");
        assert_eq!(decl["parameters"]["type"], "OBJECT");
    }

    #[test]
    fn test_convert_turns_function_round_trip() {
        let call = ToolCall::new("call_1", "read_file", json!({"file_path": "main.py"}));
        let turns = vec![
            Turn::User { text: "read it".into() },
            Turn::Model {
                text: None,
                calls: vec![call.clone()],
            },
            Turn::Tool {
                call_id: call.id.clone(),
                name: call.name.clone(),
                result: ToolResult::success("print('hi')"),
            },
            Turn::Tool {
                call_id: "call_2".into(),
                name: "run_script".into(),
                result: ToolResult::error("Error: File not found: \"x.py\""),
            },
        ];

        let contents = convert_turns(&turns);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["name"], "read_file");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["args"]["file_path"], "main.py");
        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["functionResponse"]["response"]["result"], "print('hi')");
        assert!(responses[1]["functionResponse"]["response"]["error"].is_string());
    }

    #[test]
    fn test_parse_function_calls_synthesizes_ids() {
        let response = parse(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "list_directory", "args": {}}},
                    {"functionCall": {"name": "read_file", "args": {"file_path": "a.py"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 42, "candidatesTokenCount": 7}
        }))
        .unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        let ids: Vec<&str> = response.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["call_1", "call_2"]);
        assert_eq!(response.tool_calls[1].arguments["file_path"], "a.py");
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 7);
    }

    #[test]
    fn test_parse_keeps_provided_ids_and_joins_text() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Hello, "},
                    {"text": "world"},
                    {"functionCall": {"id": "fc-abc", "name": "read_file", "args": {}}}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(response.content.as_deref(), Some("Hello, world"));
        assert_eq!(response.tool_calls[0].id, "fc-abc");
        assert_eq!(response.usage, TokenUsage::default());
    }

    #[test]
    fn test_parse_no_candidates_is_empty_response() {
        let err = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse(ref r) if r.contains("SAFETY")));

        let err = parse(json!({})).unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse(ref r) if r == "no candidates"));
    }

    #[test]
    fn test_parse_candidate_without_content() {
        let response = parse(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();

        assert!(response.is_empty());
        assert_eq!(response.stop_reason, StopReason::Other);
    }
}
