// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! File metadata tool
//!
//! A missing path is reported as `"exists": false` rather than as an error.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::Metadata;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{parse_input, require_path, SchemaBuilder, Tool, ToolContext};

/// Tool for inspecting a file or directory
pub struct FileInfoTool;

#[derive(Debug, Deserialize)]
struct FileInfoInput {
    path: String,
}

#[derive(Debug, Default, Serialize)]
struct FileInfo {
    path: String,
    is_directory: bool,
    size: u64,
    mode: String,
    mod_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_count: Option<usize>,
    exists: bool,
}

/// `ls -l` style permission string, e.g. `-rw-r--r--`
#[cfg(unix)]
fn mode_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let bits = metadata.permissions().mode();
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let flags = ['r', 'w', 'x'];
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in (0..9).rev() {
        let flag = flags[(8 - shift) % 3];
        out.push(if bits & (1 << shift) != 0 { flag } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn mode_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let write = if metadata.permissions().readonly() { '-' } else { 'w' };
    format!("{}r{}-", kind, write)
}

#[async_trait]
impl Tool for FileInfoTool {
    fn name(&self) -> &str {
        "get_file_info"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_file_info".to_string(),
            description: "Get information about a file or directory (size, permissions, modification time, line count).".to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "The path to get information about", true)
                .build(),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let input: FileInfoInput = parse_input(input)?;
        let path = context.resolve_path(require_path(&input.path)?);

        let mut info = FileInfo {
            path: input.path.clone(),
            ..FileInfo::default()
        };

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::to_string(&info)?);
            }
            Err(e) => {
                return Err(QuillError::ToolExecution(format!(
                    "failed to stat file: {}",
                    e
                )))
            }
        };

        info.exists = true;
        info.is_directory = metadata.is_dir();
        info.size = metadata.len();
        info.mode = mode_string(&metadata);
        if let Ok(modified) = metadata.modified() {
            let local: DateTime<Local> = modified.into();
            info.mod_time = local.format("%Y-%m-%d %H:%M:%S").to_string();
        }

        if !metadata.is_dir() && metadata.len() > 0 {
            if let Ok(bytes) = std::fs::read(&path) {
                info.line_count = Some(String::from_utf8_lossy(&bytes).lines().count());
            }
        }

        Ok(serde_json::to_string(&info)?)
    }
}
