//! ToolRegistry - routes model-issued calls to tool implementations

use std::collections::BTreeMap;
use std::path::Path;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{ToolCall, ToolDefinition};

use super::builtin::{ListDirectoryTool, ReadFileTool, RunScriptTool, WriteFileTool};
use super::{Tool, ToolContext, ToolError, ToolKind, ToolResult};

/// Argument key that always carries the sandbox root into a tool call
pub const ROOT_ARGUMENT: &str = "working_directory";

/// Closed registry of tools, bound to one sandbox root for its lifetime
pub struct ToolRegistry {
    ctx: ToolContext,
    tools: BTreeMap<ToolKind, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with all four standard tools
    pub fn standard(ctx: ToolContext, script_runner: RunScriptTool) -> Self {
        let mut registry = Self::empty(ctx);
        registry.register(Box::new(ListDirectoryTool));
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(WriteFileTool));
        registry.register(Box::new(script_runner));
        registry
    }

    /// Create an empty registry (for testing)
    pub fn empty(ctx: ToolContext) -> Self {
        debug!(root = ?ctx.root(), "ToolRegistry::empty: called");
        Self {
            ctx,
            tools: BTreeMap::new(),
        }
    }

    /// Add a tool, replacing any tool of the same kind
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        debug!(tool = %tool.kind(), "ToolRegistry::register: called");
        self.tools.insert(tool.kind(), tool);
    }

    /// Sandbox root every call is confined to
    pub fn root(&self) -> &Path {
        self.ctx.root()
    }

    /// Tool definitions for the model, in a stable order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition::new(t.kind().as_str(), t.description(), t.input_schema()))
            .collect()
    }

    /// The arguments a tool will actually receive
    ///
    /// The model's arguments must be an object (or null); the sandbox root is
    /// written into [`ROOT_ARGUMENT`], overriding anything the model put there.
    pub fn resolve_arguments(&self, arguments: &Value) -> Result<Value, ToolError> {
        let mut map = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(ToolError::InvalidArgument(format!(
                    "arguments must be an object, got {}",
                    other
                )));
            }
        };

        let root = self.ctx.root().display().to_string();
        if let Some(previous) = map.insert(ROOT_ARGUMENT.to_string(), Value::String(root.clone()))
            && previous.as_str() != Some(root.as_str())
        {
            warn!(?previous, "Model-supplied working_directory overridden with sandbox root");
        }

        Ok(Value::Object(map))
    }

    /// Execute a tool call
    ///
    /// Never fails: unknown names, bad arguments and panicking tools all come
    /// back as error results.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        debug!(id = %call.id, name = %call.name, "ToolRegistry::dispatch: called");

        let tool = match call.name.parse::<ToolKind>() {
            Ok(kind) => match self.tools.get(&kind) {
                Some(tool) => tool,
                None => return ToolError::UnknownTool { name: call.name.clone() }.into(),
            },
            Err(e) => {
                debug!(name = %call.name, "ToolRegistry::dispatch: unknown tool");
                return e.into();
            }
        };

        let arguments = match self.resolve_arguments(&call.arguments) {
            Ok(arguments) => arguments,
            Err(e) => return e.into(),
        };

        match std::panic::AssertUnwindSafe(tool.execute(arguments, &self.ctx))
            .catch_unwind()
            .await
        {
            Ok(result) => {
                debug!(name = %call.name, is_error = result.is_error, "ToolRegistry::dispatch: tool finished");
                result
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(name = %call.name, %message, "Tool panicked");
                ToolError::Panicked {
                    name: call.name.clone(),
                    message,
                }
                .into()
            }
        }
    }

    /// Get tool names
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().map(|kind| kind.as_str()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("root", &self.ctx.root())
            .field("tools", &self.tool_names())
            .finish()
    }
}
