// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM Provider trait and related types
//!
//! Defines the abstraction over the remote model call. A provider turns a
//! [`CompletionRequest`] into either a full [`CompletionResponse`] or an
//! ordered stream of [`StreamEvent`]s.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;
use crate::llm::message::{ContentBlock, Message};

/// Boxed event stream returned by [`LlmProvider::complete_stream`]
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Main trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "anthropic")
    fn name(&self) -> &str;

    /// Non-streaming completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Streaming completion
    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream>;
}

/// Request for completion
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model to use
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// System prompt
    pub system: Option<String>,

    /// Maximum tokens in response
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Tools available for the model to use
    pub tools: Vec<ToolDefinition>,

    /// How to handle tool choice
    pub tool_choice: ToolChoice,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Response ID
    pub id: String,

    /// Model used
    pub model: String,

    /// Response content
    pub content: Vec<ContentBlock>,

    /// Stop reason
    pub stop_reason: Option<StopReason>,

    /// Token usage
    pub usage: Usage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of message
    EndTurn,
    /// Hit max tokens
    MaxTokens,
    /// Wants to use a tool
    ToolUse,
    /// Stop sequence hit
    StopSequence,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens
    #[serde(default)]
    pub input_tokens: u32,
    /// Output tokens
    #[serde(default)]
    pub output_tokens: u32,
}

/// Events from a streaming response.
///
/// `index` is the position of the content block within the model turn.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of text for the block at `index`
    TextDelta { index: usize, text: String },

    /// The model started a tool invocation at `index`
    ToolUseStarted {
        index: usize,
        id: String,
        name: String,
    },

    /// A fragment of the JSON input for the tool invocation at `index`
    ToolInputDelta { index: usize, partial_json: String },

    /// The model turn is complete
    TurnComplete {
        stop_reason: Option<StopReason>,
        usage: Usage,
    },

    /// Ping (keep-alive)
    Ping,

    /// Error reported inside the stream
    Error { error_type: String, message: String },
}

/// Tool definition for the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Input schema (JSON Schema)
    pub input_schema: ToolInputSchema,
}

/// Input schema for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    /// Schema type (always "object")
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Property definitions
    pub properties: serde_json::Value,

    /// Required properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// How the model should choose to use tools
#[derive(Debug, Clone, Default)]
pub enum ToolChoice {
    /// Let the model decide
    #[default]
    Auto,
    /// Don't use any tools
    None,
    /// Must use a tool
    Required,
    /// Use a specific tool
    Specific(String),
}

impl CompletionRequest {
    /// Create a new completion request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            max_tokens: 1024,
            temperature: 0.7,
            tools: vec![],
            tool_choice: ToolChoice::Auto,
        }
    }

    /// Set the system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

impl Usage {
    /// Get total tokens used
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}
