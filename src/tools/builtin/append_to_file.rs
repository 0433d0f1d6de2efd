// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Append tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{parse_input, require_path, SchemaBuilder, Tool, ToolContext};

/// Tool for appending to a file, creating it when missing
pub struct AppendToFileTool;

fn default_newline() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AppendInput {
    path: String,
    #[serde(default)]
    content: String,
    #[serde(default = "default_newline")]
    newline: bool,
}

#[async_trait]
impl Tool for AppendToFileTool {
    fn name(&self) -> &str {
        "append_to_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "append_to_file".to_string(),
            description: "Append content to the end of an existing file. Creates the file if it doesn't exist.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "The path to the file to append to", true)
                .string("content", "The content to append to the file", true)
                .boolean("newline", "Start the content on a new line when the file does not end with one. Defaults to true.", false)
                .build(),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let input: AppendInput = parse_input(input)?;
        let path = context.resolve_path(require_path(&input.path)?);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuillError::ToolExecution(format!("failed to create directory: {}", e))
            })?;
        }

        let needs_separator = input.newline
            && std::fs::read(&path)
                .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
                .unwrap_or(false);

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| QuillError::ToolExecution(format!("failed to open file: {}", e)))?;

        if needs_separator {
            file.write_all(b"\n")
                .map_err(|e| QuillError::ToolExecution(format!("failed to write newline: {}", e)))?;
        }
        file.write_all(input.content.as_bytes())
            .map_err(|e| QuillError::ToolExecution(format!("failed to append content: {}", e)))?;

        Ok(format!("Successfully appended content to: {}", input.path))
    }
}
