// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! File edit tool
//!
//! Loads a file, hands it to the edit engine and writes the result back.
//! The file is only rewritten when the edit succeeds.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::edit::{apply_edit, EditInstruction, EditMode};
use crate::tools::{parse_input, require_path, SchemaBuilder, Tool, ToolContext};

/// Tool for structured edits of existing files
pub struct FileEditTool;

#[derive(Debug, Deserialize)]
struct EditFileInput {
    path: String,
    #[serde(default)]
    mode: String,
    #[serde(default, alias = "old_str")]
    old_text: Option<String>,
    #[serde(default, alias = "new_str")]
    new_text: Option<String>,
    #[serde(default)]
    line_number: Option<usize>,
}

impl EditFileInput {
    fn instruction(&self) -> Result<EditInstruction> {
        if self.mode.trim().is_empty() {
            return Err(QuillError::InvalidInput("mode is required".to_string()));
        }
        let mode: EditMode = self.mode.parse()?;
        Ok(EditInstruction {
            mode,
            old_text: self.old_text.clone(),
            new_text: self.new_text.clone(),
            line_number: self.line_number,
        })
    }
}

#[async_trait]
impl Tool for FileEditTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn definition(&self) -> ToolDefinition {
        let modes: Vec<&str> = EditMode::ALL.iter().map(|m| m.as_str()).collect();

        ToolDefinition {
            name: "edit_file".to_string(),
            description: "Make a targeted edit to an existing file.\n\n\
                Modes:\n\
                - replace: replace old_text with new_text; old_text must occur exactly once\n\
                - insert_after / insert_before: insert new_text as a new line next to the line given by line_number, or the single line containing old_text\n\
                - delete_line: remove the line given by line_number, or the single line containing old_text\n\
                - append / prepend: add new_text at the end or start of the file\n\n\
                line_number is 1-based and takes priority over old_text."
                .to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "The path to the file to edit", true)
                .enumeration("mode", "The kind of edit to perform", &modes, true)
                .string("old_text", "Text to find. Must match exactly once.", false)
                .string("new_text", "Text to insert or replace with", false)
                .integer("line_number", "1-based line to target for insert_after, insert_before and delete_line", false)
                .build(),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let input: EditFileInput = parse_input(input)?;
        let path = context.resolve_path(require_path(&input.path)?);
        let instruction = input.instruction()?;

        let content = std::fs::read_to_string(&path)
            .map_err(|e| QuillError::ToolExecution(format!("failed to read file: {}", e)))?;

        let updated = apply_edit(&content, &instruction)?;

        std::fs::write(&path, updated)
            .map_err(|e| QuillError::ToolExecution(format!("failed to write file: {}", e)))?;

        tracing::debug!(
            target: "quill.tools.executor",
            path = %path.display(),
            mode = %instruction.mode,
            "file edited"
        );

        Ok(format!(
            "Successfully edited {} using {} mode",
            input.path, instruction.mode
        ))
    }
}
