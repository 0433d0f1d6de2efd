// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool execution engine
//!
//! Looks tools up by name and runs them. Every outcome, including an unknown
//! tool name or a failing handler, becomes a [`ToolResult`]; dispatch itself
//! never fails.

use crate::llm::message::{ContentBlock, Message};
use crate::llm::provider::ToolDefinition;

use super::{ToolContext, ToolRegistry, ToolResult};

/// Text of the result returned for a name the registry does not know
pub const TOOL_NOT_FOUND: &str = "tool not found";

/// Tool executor that dispatches tool calls against a registry
pub struct ToolExecutor {
    registry: ToolRegistry,
    context: ToolContext,
}

impl ToolExecutor {
    /// Create an executor over the built-in tools
    pub fn new(context: ToolContext) -> Self {
        Self::with_registry(ToolRegistry::with_builtins(), context)
    }

    /// Create an executor over a specific registry
    pub fn with_registry(registry: ToolRegistry, context: ToolContext) -> Self {
        Self { registry, context }
    }

    /// Get tool definitions for the LLM
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// The context tools run with
    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Execute one tool use from the model's response
    pub async fn execute_tool_use(
        &self,
        tool_use_id: &str,
        tool_name: &str,
        input: serde_json::Value,
    ) -> ToolResult {
        let Some(tool) = self.registry.get(tool_name) else {
            tracing::debug!(
                target: "quill.tools.executor",
                tool = tool_name,
                tool_use_id,
                "unknown tool requested"
            );
            return ToolResult::error(tool_use_id, TOOL_NOT_FOUND);
        };

        tracing::debug!(
            target: "quill.tools.executor",
            tool = tool_name,
            tool_use_id,
            "executing tool"
        );

        match tool.execute(input, &self.context).await {
            Ok(output) => ToolResult::success(tool_use_id, output),
            Err(e) => {
                tracing::debug!(
                    target: "quill.tools.executor",
                    tool = tool_name,
                    error = %e,
                    "tool returned an error"
                );
                ToolResult::error(tool_use_id, e.to_string())
            }
        }
    }

    /// Convert tool results to the user turn that carries them back
    pub fn results_to_message(results: Vec<ToolResult>) -> Message {
        let blocks: Vec<ContentBlock> = results
            .into_iter()
            .map(|r| {
                let is_error = r.is_error();
                let content = r.output_text().to_string();
                ContentBlock::ToolResult {
                    tool_use_id: r.tool_use_id,
                    content,
                    is_error,
                }
            })
            .collect();

        Message::tool_results(blocks)
    }
}
