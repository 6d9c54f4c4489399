//! read_file tool - read a text file, capped at a fixed size

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolKind, ToolResult};

/// Maximum number of characters returned from a single read
pub const MAX_CHARS: usize = 10_000;

/// Read a file's contents as text
pub struct ReadFileTool;

impl ReadFileTool {
    async fn read(&self, path: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let full_path = ctx.resolve(path, "read")?;

        if !full_path.is_file() {
            debug!(?full_path, "ReadFileTool::read: missing or not a regular file");
            return Err(ToolError::NotFound {
                what: "File not found or is not a regular file",
                path: path.into(),
            });
        }

        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| ToolError::io(path, e))?;

        Ok(truncate(content, path))
    }
}

/// Cut `content` to [`MAX_CHARS`] characters and note the truncation
fn truncate(mut content: String, path: &str) -> String {
    if let Some((cut, _)) = content.char_indices().nth(MAX_CHARS) {
        debug!(%path, "truncate: content exceeds cap");
        content.truncate(cut);
        content.push_str(&format!("\n[...File \"{}\" truncated at {} characters]", path, MAX_CHARS));
    }
    content
}

#[async_trait]
impl Tool for ReadFileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ReadFile
    }

    fn description(&self) -> &'static str {
        "Reads the contents of a file (up to 10000 characters), constrained to the working directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read, relative to the working directory."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ReadFileTool::execute: called");
        let Some(path) = input["file_path"].as_str() else {
            return ToolError::InvalidArgument("file_path is required".to_string()).into();
        };
        self.read(path, ctx).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2\nline 3").unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({"file_path": "test.txt"}), &ctx)
            .await;

        assert!(result.ok());
        assert_eq!(result.content, "line 1\nline 2\nline 3");
    }

    #[tokio::test]
    async fn test_read_file_exactly_at_cap_is_untouched() {
        let temp = tempdir().unwrap();
        let content = "a".repeat(MAX_CHARS);
        fs::write(temp.path().join("big.txt"), &content).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({"file_path": "big.txt"}), &ctx)
            .await;

        assert!(result.ok());
        assert_eq!(result.content, content);
    }

    #[tokio::test]
    async fn test_read_file_over_cap_is_truncated() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("big.txt"), "a".repeat(MAX_CHARS + 1)).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({"file_path": "big.txt"}), &ctx)
            .await;

        assert!(result.ok());
        let marker = "\n[...File \"big.txt\" truncated at 10000 characters]";
        assert!(result.content.ends_with(marker));
        assert_eq!(result.content.len() - marker.len(), MAX_CHARS);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let content = "é".repeat(MAX_CHARS);
        assert_eq!(truncate(content.clone(), "x"), content);

        let truncated = truncate("é".repeat(MAX_CHARS + 5), "x");
        let body = truncated.split('\n').next().unwrap();
        assert_eq!(body.chars().count(), MAX_CHARS);
    }

    #[tokio::test]
    async fn test_read_file_not_found() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({"file_path": "nonexistent.txt"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("File not found or is not a regular file"));
        assert!(result.content.contains("nonexistent.txt"));
    }

    #[tokio::test]
    async fn test_read_file_directory_is_rejected() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("pkg")).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool.execute(serde_json::json!({"file_path": "pkg"}), &ctx).await;

        assert!(result.is_error);
        assert!(result.content.contains("not a regular file"));
    }

    #[tokio::test]
    async fn test_read_file_outside_root() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({"file_path": "../../etc/passwd"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("Cannot read \"../../etc/passwd\""));
    }

    #[tokio::test]
    async fn test_read_file_missing_argument() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ReadFileTool.execute(serde_json::json!({}), &ctx).await;

        assert!(result.is_error);
        assert!(result.content.contains("file_path is required"));
    }
}
