//! Tool error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during tool execution
///
/// None of these are fatal to a conversation: the registry renders every
/// variant into a failed `ToolResult` that is fed back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot {action} \"{path}\" as it is outside the permitted working directory")]
    SandboxViolation { action: &'static str, path: PathBuf },

    #[error("{what} not found: \"{path}\"")]
    NotFound { what: &'static str, path: PathBuf },

    #[error("\"{path}\" {reason}")]
    WrongKind { path: PathBuf, reason: String },

    #[error("Executing \"{path}\" timed out after {}s", timeout.as_secs())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error on \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool {name} panicked: {message}")]
    Panicked { name: String, message: String },
}

impl ToolError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly category, used in logs
    pub fn category(&self) -> &'static str {
        match self {
            ToolError::SandboxViolation { .. } => "sandbox_violation",
            ToolError::NotFound { .. } => "not_found",
            ToolError::WrongKind { .. } => "wrong_kind",
            ToolError::Timeout { .. } => "timeout",
            ToolError::UnknownTool { .. } => "unknown_tool",
            ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::Io { .. } => "io",
            ToolError::Panicked { .. } => "panicked",
        }
    }
}
