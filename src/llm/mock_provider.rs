// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock LLM provider for testing
//!
//! Plays back a script of [`MockStep`]s, one per model call, so chat flows
//! can be exercised without a network. Every request is recorded for later
//! inspection.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ApiError, Result};
use crate::llm::message::ContentBlock;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, EventStream, LlmProvider, StopReason, StreamEvent,
    Usage,
};

/// Size of the text fragments produced by the streaming path
const TEXT_CHUNK_CHARS: usize = 10;

/// A mock LLM provider for testing
#[derive(Clone, Default)]
pub struct MockProvider {
    /// Remaining scripted steps, consumed front to back
    script: Arc<Mutex<VecDeque<MockStep>>>,
    /// Recorded requests
    recorded_requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// What the mock does for one model call
#[derive(Clone, Debug)]
pub enum MockStep {
    /// Answer with a complete response
    Reply(MockResponse),
    /// Reject the call before any event is produced
    Fail(MockFailure),
    /// Stream exactly these events, nothing more
    Events(Vec<StreamEvent>),
    /// Stream some text, then never finish
    Stall(String),
}

/// Failures the mock can produce
#[derive(Clone, Debug)]
pub enum MockFailure {
    RateLimited(u32),
    Server { status: u16, message: String },
    Network(String),
}

/// A pre-configured response for the mock provider
#[derive(Clone, Debug)]
pub struct MockResponse {
    /// Text content to return
    pub text: String,
    /// Tool calls to return (optional)
    pub tool_calls: Vec<MockToolCall>,
    /// Stop reason
    pub stop_reason: StopReason,
    /// Token usage
    pub usage: Usage,
}

/// A mock tool call
#[derive(Clone, Debug)]
pub struct MockToolCall {
    /// Tool call ID
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool input (JSON)
    pub input: serde_json::Value,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            text: "Mock response".to_string(),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        }
    }
}

impl MockResponse {
    /// A plain text answer that ends the turn
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A response that requests one tool call
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            text: String::new(),
            tool_calls: vec![MockToolCall {
                id: id.into(),
                name: name.into(),
                input,
            }],
            stop_reason: StopReason::ToolUse,
            usage: Usage::default(),
        }
    }

    /// Add another tool call after the existing ones
    pub fn and_tool_call(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        self.tool_calls.push(MockToolCall {
            id: id.into(),
            name: name.into(),
            input,
        });
        self.stop_reason = StopReason::ToolUse;
        self
    }

    /// Set leading text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let mut index = 0;

        if !self.text.is_empty() {
            events.extend(text_chunks(&self.text).into_iter().map(|text| {
                StreamEvent::TextDelta { index, text }
            }));
            index += 1;
        }

        for call in self.tool_calls {
            events.push(StreamEvent::ToolUseStarted {
                index,
                id: call.id,
                name: call.name,
            });
            // Split the input in two to exercise incremental assembly
            let json = call.input.to_string();
            let chars: Vec<char> = json.chars().collect();
            let (head, tail) = chars.split_at(chars.len() / 2);
            for part in [head, tail] {
                if !part.is_empty() {
                    events.push(StreamEvent::ToolInputDelta {
                        index,
                        partial_json: part.iter().collect(),
                    });
                }
            }
            index += 1;
        }

        events.push(StreamEvent::TurnComplete {
            stop_reason: Some(self.stop_reason),
            usage: self.usage,
        });
        events
    }
}

fn text_chunks(text: &str) -> Vec<String> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(TEXT_CHUNK_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

impl From<MockFailure> for ApiError {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::RateLimited(secs) => ApiError::RateLimited(secs),
            MockFailure::Server { status, message } => ApiError::ServerError { status, message },
            MockFailure::Network(msg) => ApiError::Network(msg),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock provider lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl MockProvider {
    /// Create a new mock provider with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider that plays back `steps` in order
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        let provider = Self::new();
        lock(&provider.script).extend(steps);
        provider
    }

    /// Queue one more step
    pub fn push_step(&self, step: MockStep) {
        lock(&self.script).push_back(step);
    }

    /// Get the number of model calls made
    pub fn call_count(&self) -> usize {
        lock(&self.recorded_requests).len()
    }

    /// Number of scripted steps not consumed yet
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    /// Get all recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock(&self.recorded_requests).clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.recorded_requests).last().cloned()
    }

    fn next_step(&self, request: &CompletionRequest) -> Result<MockStep> {
        lock(&self.recorded_requests).push(request.clone());
        let step = lock(&self.script).pop_front();
        step.ok_or_else(|| ApiError::InvalidResponse("mock script exhausted".to_string()).into())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = match self.next_step(&request)? {
            MockStep::Reply(response) => response,
            MockStep::Fail(failure) => return Err(ApiError::from(failure).into()),
            MockStep::Events(_) | MockStep::Stall(_) => {
                return Err(ApiError::InvalidResponse(
                    "streaming-only step used for a non-streaming call".to_string(),
                )
                .into())
            }
        };

        let mut content = vec![];
        if !response.text.is_empty() {
            content.push(ContentBlock::Text {
                text: response.text,
            });
        }
        for call in response.tool_calls {
            content.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.name,
                input: call.input,
            });
        }

        Ok(CompletionResponse {
            id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            model: request.model,
            content,
            stop_reason: Some(response.stop_reason),
            usage: response.usage,
        })
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream> {
        let stream: EventStream = match self.next_step(&request)? {
            MockStep::Reply(response) => {
                Box::pin(stream::iter(response.into_events().into_iter().map(Ok)))
            }
            MockStep::Fail(failure) => return Err(ApiError::from(failure).into()),
            MockStep::Events(events) => Box::pin(stream::iter(events.into_iter().map(Ok))),
            MockStep::Stall(text) => {
                let head = text_chunks(&text)
                    .into_iter()
                    .map(|text| Ok(StreamEvent::TextDelta { index: 0, text }));
                Box::pin(stream::iter(head).chain(stream::pending()))
            }
        };
        Ok(stream)
    }
}
