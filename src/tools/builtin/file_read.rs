// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! File read tool
//!
//! Reads a whole file, or an inclusive 1-based range of its lines.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{parse_input, require_path, SchemaBuilder, Tool, ToolContext};

/// Tool for reading file contents
pub struct FileReadTool;

#[derive(Debug, Deserialize)]
struct ReadFileInput {
    path: String,
    #[serde(default)]
    start_line: Option<i64>,
    #[serde(default)]
    end_line: Option<i64>,
}

/// Select lines `start..=end` (1-based) from `content`, clamping `end`.
fn select_lines(content: &str, start: Option<i64>, end: Option<i64>) -> Result<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    let total = lines.len() as i64;

    let start_line = match start {
        Some(n) if n < 1 => {
            return Err(QuillError::InvalidInput(
                "start_line must be >= 1".to_string(),
            ))
        }
        Some(n) => n,
        None => 1,
    };
    let end_line = match end {
        Some(n) if n < 1 => {
            return Err(QuillError::InvalidInput("end_line must be >= 1".to_string()))
        }
        Some(n) => n,
        None => total,
    };

    if start_line > end_line {
        return Err(QuillError::InvalidInput(
            "start_line cannot be greater than end_line".to_string(),
        ));
    }
    if start_line > total {
        return Err(QuillError::InvalidInput(format!(
            "start_line ({}) exceeds total lines ({})",
            start_line, total
        )));
    }

    let from = (start_line - 1) as usize;
    let to = end_line.min(total) as usize;
    Ok(lines[from..to].join("\n"))
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_file".to_string(),
            description: "Read the contents of a file. Optionally pass start_line and end_line (1-based, inclusive) to read only part of it.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "The path to the file to read (absolute or relative to working directory)", true)
                .integer("start_line", "First line to return (1-based). Defaults to 1.", false)
                .integer("end_line", "Last line to return (1-based, inclusive). Defaults to the last line.", false)
                .build(),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let input: ReadFileInput = parse_input(input)?;
        let path = context.resolve_path(require_path(&input.path)?);

        let content = std::fs::read_to_string(&path).map_err(|e| {
            QuillError::ToolExecution(format!("failed to read file {}: {}", path.display(), e))
        })?;

        if input.start_line.is_none() && input.end_line.is_none() {
            return Ok(content);
        }
        select_lines(&content, input.start_line, input.end_line)
    }
}
