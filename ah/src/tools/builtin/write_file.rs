//! write_file tool - write content to a file

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolKind, ToolResult};

/// Write content to a file, creating parent directories and overwriting
pub struct WriteFileTool;

impl WriteFileTool {
    async fn write(&self, path: &str, content: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let full_path = ctx.resolve(path, "write to")?;
        debug!(?full_path, "WriteFileTool::write: path validated");

        if full_path.is_dir() {
            return Err(ToolError::WrongKind {
                path: path.into(),
                reason: "is a directory".to_string(),
            });
        }

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::io(path, e))?;
        }
        debug!("WriteFileTool::write: parent directories ensured");

        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| ToolError::io(path, e))?;

        let written = content.chars().count();
        debug!(%written, "WriteFileTool::write: file written successfully");
        Ok(format!("Successfully wrote to \"{}\" ({} characters written)", path, written))
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WriteFile
    }

    fn description(&self) -> &'static str {
        "Writes content to a file, creating parent directories if needed and overwriting any existing file, constrained to the working directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write, relative to the working directory."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "WriteFileTool::execute: called");
        let Some(path) = input["file_path"].as_str() else {
            return ToolError::InvalidArgument("file_path is required".to_string()).into();
        };
        let Some(content) = input["content"].as_str() else {
            return ToolError::InvalidArgument("content is required".to_string()).into();
        };
        self.write(path, content, ctx).await.into()
    }
}
