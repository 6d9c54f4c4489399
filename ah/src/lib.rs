//! agentharness - sandboxed tool-dispatch loop for function-calling models
//!
//! A prompt goes to a model along with a fixed set of tool schemas. Whenever
//! the model asks for tool calls, the calls run against a single sandbox
//! directory and their results are appended to the conversation, which is
//! resent on the next round-trip. The loop ends on a plain-text answer or
//! after a bounded number of round-trips.
//!
//! # Modules
//!
//! - [`tools`] - Sandbox guard, the four built-in tools, and the registry
//! - [`conversation`] - Append-only conversation history
//! - [`llm`] - Model client trait with Gemini and Anthropic implementations
//! - [`r#loop`] - The dispatch loop state machine
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod prompts;
pub mod tools;

// Note: 'loop' is a reserved keyword, so we use r#loop
#[path = "loop/mod.rs"]
pub mod r#loop;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use conversation::{Conversation, Turn};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError, ToolCall, create_client,
};
pub use r#loop::{LoopConfig, LoopEngine, LoopError, LoopEvent, LoopOutcome, LoopState};
pub use tools::{Tool, ToolContext, ToolError, ToolKind, ToolRegistry, ToolResult};
