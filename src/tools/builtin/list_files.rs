// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Directory listing tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{parse_input, SchemaBuilder, Tool, ToolContext};

/// Tool for listing directory contents
pub struct ListFilesTool;

#[derive(Debug, Deserialize)]
struct ListFilesInput {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    recursive: bool,
    #[serde(default)]
    max_depth: Option<usize>,
}

fn display_name(rel: &Path, is_dir: bool) -> String {
    let name = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if is_dir {
        format!("{}/", name)
    } else {
        name
    }
}

fn list_flat(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| QuillError::ToolExecution(format!("failed to read directory: {}", e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| QuillError::ToolExecution(format!("failed to read directory: {}", e)))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        files.push(display_name(Path::new(&entry.file_name()), is_dir));
    }
    Ok(files)
}

/// Walk `dir`; entries deeper than `max_depth` separators are skipped.
fn list_recursive(dir: &Path, max_depth: Option<usize>) -> Result<Vec<String>> {
    let mut walker = WalkDir::new(dir).min_depth(1);
    if let Some(depth) = max_depth {
        // walkdir counts the root's children as depth 1
        walker = walker.max_depth(depth + 1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry
            .map_err(|e| QuillError::ToolExecution(format!("failed to walk directory: {}", e)))?;
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        files.push(display_name(rel, entry.file_type().is_dir()));
    }
    Ok(files)
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_files".to_string(),
            description: "List files and directories at a given path. Directories are marked with a trailing slash. Returns a JSON array of names.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "Directory to list. Defaults to the working directory.", false)
                .boolean("recursive", "Whether to list files recursively. Defaults to false.", false)
                .integer("max_depth", "Maximum depth to recurse. Only applies if recursive is true.", false)
                .build(),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let input: ListFilesInput = parse_input(input)?;
        let dir = match input.path.as_deref() {
            Some(p) if !p.trim().is_empty() => context.resolve_path(p),
            _ => context.working_directory.clone(),
        };

        let mut files = if input.recursive {
            list_recursive(&dir, input.max_depth)?
        } else {
            list_flat(&dir)?
        };
        files.sort();

        tracing::trace!(
            target: "quill.tools.executor",
            dir = %dir.display(),
            count = files.len(),
            "listed directory"
        );

        Ok(serde_json::to_string(&files)?)
    }
}
