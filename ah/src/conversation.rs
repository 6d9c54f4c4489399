//! Conversation state - the ordered, append-only history sent on every round-trip

use serde::Serialize;
use tracing::debug;

use crate::llm::ToolCall;
use crate::tools::ToolResult;

/// One entry in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    /// Instructions for the model
    System { text: String },

    /// The operator's prompt
    User { text: String },

    /// A model reply: optional text plus the calls it requested, in order
    Model { text: Option<String>, calls: Vec<ToolCall> },

    /// The result of one tool call
    Tool {
        call_id: String,
        name: String,
        #[serde(serialize_with = "serialize_result")]
        result: ToolResult,
    },
}

fn serialize_result<S: serde::Serializer>(result: &ToolResult, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut s = serializer.serialize_struct("ToolResult", 2)?;
    s.serialize_field("ok", &result.ok())?;
    s.serialize_field("payload", &result.content)?;
    s.end()
}

impl Turn {
    /// Short label for logs
    pub fn role(&self) -> &'static str {
        match self {
            Turn::System { .. } => "system",
            Turn::User { .. } => "user",
            Turn::Model { .. } => "model",
            Turn::Tool { .. } => "tool",
        }
    }
}

/// Ordered history of turns
///
/// Turns can only be appended; nothing is ever removed or rewritten, so the
/// model always sees every earlier turn in its original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with a system turn and the user's prompt
    pub fn seeded(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push_system(system);
        conversation.push_user(prompt);
        conversation
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.push(Turn::System { text: text.into() });
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Turn::User { text: text.into() });
    }

    pub fn push_model(&mut self, text: Option<String>, calls: Vec<ToolCall>) {
        self.push(Turn::Model { text, calls });
    }

    pub fn push_tool(&mut self, call: &ToolCall, result: ToolResult) {
        self.push(Turn::Tool {
            call_id: call.id.clone(),
            name: call.name.clone(),
            result,
        });
    }

    fn push(&mut self, turn: Turn) {
        debug!(role = turn.role(), index = self.turns.len(), "Conversation::push: called");
        self.turns.push(turn);
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
