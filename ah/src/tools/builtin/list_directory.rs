//! list_directory tool - list the immediate entries of a directory

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolKind, ToolResult};

/// List files and directories in a path, with sizes
pub struct ListDirectoryTool;

impl ListDirectoryTool {
    async fn list(&self, dir: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let full_path = ctx.resolve(dir, "list")?;
        debug!(?full_path, "ListDirectoryTool::list: path validated");

        if !full_path.is_dir() {
            debug!("ListDirectoryTool::list: not a directory");
            return Err(ToolError::WrongKind {
                path: dir.into(),
                reason: "is not a directory".to_string(),
            });
        }

        let mut reader = tokio::fs::read_dir(&full_path)
            .await
            .map_err(|e| ToolError::io(dir, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| ToolError::io(dir, e))? {
            let name = entry.file_name().to_string_lossy().to_string();
            // Follows symlinks, like a plain `stat`
            let line = match tokio::fs::metadata(entry.path()).await {
                Ok(metadata) => format!(
                    "- {}: file_size={} bytes, is_dir={}",
                    name,
                    metadata.len(),
                    metadata.is_dir()
                ),
                Err(e) => {
                    debug!(%name, %e, "ListDirectoryTool::list: failed to get metadata");
                    format!("- {}: file_size=Error getting size: {}, is_dir=false", name, e)
                }
            };
            entries.push((name, line));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(entries_count = %entries.len(), "ListDirectoryTool::list: entries collected");

        Ok(entries.into_iter().map(|(_, line)| line).collect::<Vec<_>>().join("\n"))
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ListDirectory
    }

    fn description(&self) -> &'static str {
        "Lists files in the specified directory along with their sizes, constrained to the working directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ListDirectoryTool::execute: called");
        let dir = input["directory"].as_str().unwrap_or(".");
        self.list(dir, ctx).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_directory_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("file1.txt"), "hello").unwrap();
        fs::write(temp.path().join("file2.txt"), "").unwrap();
        fs::create_dir(temp.path().join("subdir")).unwrap();

        let ctx = ToolContext::new(temp.path()).unwrap();
        let result = ListDirectoryTool.execute(serde_json::json!({}), &ctx).await;

        assert!(result.ok());
        assert!(result.content.contains("- file1.txt: file_size=5 bytes, is_dir=false"));
        assert!(result.content.contains("- file2.txt: file_size=0 bytes, is_dir=false"));
        assert!(result.content.contains("- subdir: file_size="));
        assert!(result.content.contains("is_dir=true"));
        assert_eq!(result.content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_list_directory_is_sorted_and_not_recursive() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("b/deep.txt"), "").unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();

        let ctx = ToolContext::new(temp.path()).unwrap();
        let result = ListDirectoryTool.execute(serde_json::json!({}), &ctx).await;

        let names: Vec<&str> = result.content.lines().collect();
        assert!(names[0].starts_with("- a.txt:"));
        assert!(names[1].starts_with("- b:"));
        assert!(!result.content.contains("deep.txt"));
    }

    #[tokio::test]
    async fn test_list_directory_with_path() {
        let temp = tempdir().unwrap();
        let subdir = temp.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("nested.txt"), "").unwrap();

        let ctx = ToolContext::new(temp.path()).unwrap();
        let result = ListDirectoryTool
            .execute(serde_json::json!({"directory": "subdir"}), &ctx)
            .await;

        assert!(result.ok());
        assert!(result.content.contains("nested.txt"));
    }

    #[tokio::test]
    async fn test_list_directory_empty() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ListDirectoryTool.execute(serde_json::json!({}), &ctx).await;

        assert!(result.ok());
        assert_eq!(result.content, "");
    }

    #[tokio::test]
    async fn test_list_directory_not_a_directory() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("file.txt"), "").unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ListDirectoryTool
            .execute(serde_json::json!({"directory": "file.txt"}), &ctx)
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("\"file.txt\" is not a directory"));

        let result = ListDirectoryTool
            .execute(serde_json::json!({"directory": "nonexistent"}), &ctx)
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("is not a directory"));
    }

    #[tokio::test]
    async fn test_list_directory_outside_root() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ListDirectoryTool
            .execute(serde_json::json!({"directory": "../"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("Cannot list \"../\" as it is outside the permitted working directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_directory_reports_broken_entry_inline() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("ok.txt"), "abc").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("dangling")).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let result = ListDirectoryTool.execute(serde_json::json!({}), &ctx).await;

        assert!(result.ok());
        assert!(result.content.contains("- dangling: file_size=Error getting size:"));
        assert!(result.content.contains("- ok.txt: file_size=3 bytes"));
    }
}
