// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! File creation tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{parse_input, require_path, SchemaBuilder, Tool, ToolContext};

/// Tool for creating new files
pub struct CreateFileTool;

#[derive(Debug, Deserialize)]
struct CreateFileInput {
    path: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    overwrite: bool,
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_file".to_string(),
            description: "Create a new file with the specified content. If the file already exists, it will return an error unless overwrite is true.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "The path of the file to create", true)
                .string("content", "The content to write to the file", true)
                .boolean("overwrite", "Whether to overwrite the file if it already exists. Defaults to false.", false)
                .build(),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let input: CreateFileInput = parse_input(input)?;
        let path = context.resolve_path(require_path(&input.path)?);

        if path.exists() && !input.overwrite {
            return Err(QuillError::ToolExecution(format!(
                "file already exists: {} (use overwrite=true to replace)",
                input.path
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuillError::ToolExecution(format!("failed to create directory: {}", e))
            })?;
        }

        std::fs::write(&path, &input.content)
            .map_err(|e| QuillError::ToolExecution(format!("failed to create file: {}", e)))?;

        Ok(format!("Successfully created file: {}", input.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_file_with_parents() {
        let temp_dir = TempDir::new().unwrap();
        let context = ToolContext::new(temp_dir.path().to_path_buf());

        let output = CreateFileTool
            .execute(json!({"path": "a/b/new.txt", "content": "hi"}), &context)
            .await
            .unwrap();

        assert_eq!(output, "Successfully created file: a/b/new.txt");
        let written = std::fs::read_to_string(temp_dir.path().join("a/b/new.txt")).unwrap();
        assert_eq!(written, "hi");
    }

    #[tokio::test]
    async fn test_create_refuses_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("x.txt"), "old").unwrap();
        let context = ToolContext::new(temp_dir.path().to_path_buf());

        let err = CreateFileTool
            .execute(json!({"path": "x.txt", "content": "new"}), &context)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("file already exists: x.txt"));
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("x.txt")).unwrap(),
            "old"
        );
    }

    #[tokio::test]
    async fn test_create_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("x.txt"), "old").unwrap();
        let context = ToolContext::new(temp_dir.path().to_path_buf());

        CreateFileTool
            .execute(
                json!({"path": "x.txt", "content": "new", "overwrite": true}),
                &context,
            )
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("x.txt")).unwrap(),
            "new"
        );
    }
}
