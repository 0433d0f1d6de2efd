// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool system for Quill
//!
//! Provides the framework for the file tools the model can call. The set of
//! tools is fixed when the [`ToolRegistry`] is built; the [`ToolExecutor`]
//! looks tools up by name and turns every outcome into a [`ToolResult`].

pub mod builtin;
pub mod definition;
pub mod edit;
pub mod executor;

pub use definition::*;
pub use executor::*;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{QuillError, Result};
use crate::llm::provider::ToolDefinition;

/// Context provided to tools during execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths are resolved against
    pub working_directory: PathBuf,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(working_directory: PathBuf) -> Self {
        Self { working_directory }
    }

    /// Resolve a tool-supplied path against the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_directory.join(candidate)
        }
    }
}

/// Result of tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// The tool_use_id this result corresponds to
    pub tool_use_id: String,
    /// The output of the tool
    pub output: ToolOutput,
}

/// Output from a tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Successful output
    Success(String),
    /// Error output
    Error(String),
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_use_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output: ToolOutput::Success(output.into()),
        }
    }

    /// Create an error result
    pub fn error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output: ToolOutput::Error(error.into()),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.output, ToolOutput::Error(_))
    }

    /// Get the output text
    pub fn output_text(&self) -> &str {
        match &self.output {
            ToolOutput::Success(s) => s,
            ToolOutput::Error(s) => s,
        }
    }
}

/// Trait for implementing tools
///
/// A handler returns its text output, or an error whose message is reported
/// back to the model as a failed tool result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition for the LLM
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given input
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String>;

    /// Get the tool name
    fn name(&self) -> &str;
}

/// Decode a tool's raw JSON input into its typed form.
pub fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T> {
    serde_json::from_value(input)
        .map_err(|e| QuillError::InvalidInput(format!("failed to parse input: {}", e)))
}

/// Reject an empty `path` argument.
pub(crate) fn require_path(path: &str) -> Result<&str> {
    if path.trim().is_empty() {
        return Err(QuillError::InvalidInput("path is required".to_string()));
    }
    Ok(path)
}

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all built-in tools
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(builtin::FileReadTool));
        registry.register(Arc::new(builtin::ListFilesTool));
        registry.register(Arc::new(builtin::CreateFileTool));
        registry.register(Arc::new(builtin::FileEditTool));
        registry.register(Arc::new(builtin::AppendToFileTool));
        registry.register(Arc::new(builtin::FileInfoTool));

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by exact name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Get all tool definitions, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// List all tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
