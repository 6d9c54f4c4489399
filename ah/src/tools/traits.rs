//! Tool trait definition

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::ToolError;
use super::context::ToolContext;

/// The closed set of tools the model may call
///
/// Names arriving from the model are parsed into this enum before anything
/// runs; a name outside the set never reaches an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    ListDirectory,
    ReadFile,
    WriteFile,
    RunScript,
}

impl ToolKind {
    /// Every tool, in the order schemas are advertised
    pub const ALL: [ToolKind; 4] = [
        ToolKind::ListDirectory,
        ToolKind::ReadFile,
        ToolKind::WriteFile,
        ToolKind::RunScript,
    ];

    /// Wire name used in schemas and model function calls
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::ListDirectory => "list_directory",
            ToolKind::ReadFile => "read_file",
            ToolKind::WriteFile => "write_file",
            ToolKind::RunScript => "run_script",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool { name: s.to_string() })
    }
}

/// A tool that can be called by the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which tool this is (its name on the wire)
    fn kind(&self) -> ToolKind;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Whether the tool succeeded
    pub fn ok(&self) -> bool {
        !self.is_error
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        debug!(category = err.category(), "ToolResult::from: converting tool error");
        ToolResult::error(format!("Error: {}", err))
    }
}

impl From<Result<String, ToolError>> for ToolResult {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(content) => ToolResult::success(content),
            Err(e) => e.into(),
        }
    }
}
