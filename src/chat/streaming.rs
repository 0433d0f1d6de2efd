// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Streaming response handling
//!
//! [`StreamAccumulator`] is the synchronous part: it folds the ordered events
//! of one model call into a complete assistant turn. [`spawn_stream_pump`]
//! drives it on its own task, forwarding text fragments to the caller over a
//! bounded channel while the turn is being assembled.

use std::collections::BTreeMap;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, QuillError, Result};
use crate::llm::message::{ContentBlock, Message};
use crate::llm::provider::{CompletionResponse, EventStream, StopReason, StreamEvent, Usage};

use super::ChatEvent;

/// Key that carries tool input which did not parse as JSON
pub const RAW_INPUT_KEY: &str = "__raw_input";

/// A content block still being assembled
#[derive(Debug)]
enum PendingBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input_json: String,
    },
}

/// A fully materialized model turn
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
    pub usage: Usage,
}

impl AssistantResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }

    pub fn into_message(self) -> Message {
        Message::assistant_blocks(self.content)
    }
}

impl From<CompletionResponse> for AssistantResponse {
    fn from(response: CompletionResponse) -> Self {
        Self {
            content: response.content,
            stop_reason: response.stop_reason,
            usage: response.usage,
        }
    }
}

/// Accumulator for streaming response content
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    blocks: BTreeMap<usize, PendingBlock>,
    stop_reason: Option<StopReason>,
    usage: Usage,
    complete: bool,
}

/// Result of processing a stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEventResult {
    /// Text to display immediately
    TextDelta(String),
    /// A tool invocation began
    ToolStarted { id: String, name: String },
    /// More tool input arrived
    ToolInputDelta,
    /// The model turn is complete
    Complete,
    /// Keep-alive
    Ping,
    /// The stream reported an error
    Error { error_type: String, message: String },
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `TurnComplete` has been seen
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Text gathered so far, in block order
    pub fn text(&self) -> String {
        self.blocks
            .values()
            .filter_map(|block| match block {
                PendingBlock::Text(text) => Some(text.as_str()),
                PendingBlock::ToolUse { .. } => None,
            })
            .collect()
    }

    /// Process a stream event and report what the caller should do with it
    pub fn process_event(&mut self, event: StreamEvent) -> StreamEventResult {
        match event {
            StreamEvent::TextDelta { index, text } => {
                match self
                    .blocks
                    .entry(index)
                    .or_insert_with(|| PendingBlock::Text(String::new()))
                {
                    PendingBlock::Text(buffer) => buffer.push_str(&text),
                    PendingBlock::ToolUse { .. } => {
                        tracing::warn!(
                            target: "quill.chat.streaming",
                            index,
                            "text delta for a tool block ignored"
                        );
                    }
                }
                StreamEventResult::TextDelta(text)
            }
            StreamEvent::ToolUseStarted { index, id, name } => {
                self.blocks.insert(
                    index,
                    PendingBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input_json: String::new(),
                    },
                );
                StreamEventResult::ToolStarted { id, name }
            }
            StreamEvent::ToolInputDelta {
                index,
                partial_json,
            } => {
                if let Some(PendingBlock::ToolUse { input_json, .. }) = self.blocks.get_mut(&index)
                {
                    input_json.push_str(&partial_json);
                } else {
                    tracing::warn!(
                        target: "quill.chat.streaming",
                        index,
                        "tool input delta without a started tool block"
                    );
                }
                StreamEventResult::ToolInputDelta
            }
            StreamEvent::TurnComplete { stop_reason, usage } => {
                self.stop_reason = stop_reason;
                self.usage = usage;
                self.complete = true;
                StreamEventResult::Complete
            }
            StreamEvent::Ping => StreamEventResult::Ping,
            StreamEvent::Error {
                error_type,
                message,
            } => StreamEventResult::Error {
                error_type,
                message,
            },
        }
    }

    /// Consume the accumulator and return the materialized turn
    pub fn finish(self) -> Result<AssistantResponse> {
        if !self.complete {
            return Err(ApiError::StreamError(
                "stream ended before the turn completed".to_string(),
            )
            .into());
        }

        let content = self
            .blocks
            .into_values()
            .filter_map(|block| match block {
                PendingBlock::Text(text) if text.is_empty() => None,
                PendingBlock::Text(text) => Some(ContentBlock::Text { text }),
                PendingBlock::ToolUse {
                    id,
                    name,
                    input_json,
                } => Some(ContentBlock::ToolUse {
                    id,
                    name,
                    input: parse_tool_input(&input_json),
                }),
            })
            .collect();

        Ok(AssistantResponse {
            content,
            stop_reason: self.stop_reason,
            usage: self.usage,
        })
    }
}

/// Parse accumulated tool input; an empty input is `{}`.
fn parse_tool_input(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(
                target: "quill.chat.streaming",
                error = %e,
                "tool input is not valid JSON, keeping raw text"
            );
            let mut object = serde_json::Map::new();
            object.insert(RAW_INPUT_KEY.to_string(), Value::String(raw.to_string()));
            Value::Object(object)
        }
    }
}

/// Send `event` unless cancelled.
///
/// Returns `Ok(false)` when the receiver is gone; the caller should stop
/// forwarding but keep going.
pub(crate) async fn forward(
    events: &mpsc::Sender<ChatEvent>,
    event: ChatEvent,
    cancel: &CancellationToken,
) -> Result<bool> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QuillError::Cancelled),
        sent = events.send(event) => Ok(sent.is_ok()),
    }
}

/// Consume `stream` on a dedicated task.
///
/// Text fragments are forwarded to `events` in arrival order as they come in.
/// The task resolves to the materialized turn once `TurnComplete` arrives.
/// Cancelling `cancel` drops the stream, which aborts the underlying request.
pub fn spawn_stream_pump(
    mut stream: EventStream,
    events: mpsc::Sender<ChatEvent>,
    cancel: CancellationToken,
) -> JoinHandle<Result<AssistantResponse>> {
    tokio::spawn(async move {
        let mut accumulator = StreamAccumulator::new();
        let mut forwarding = true;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(target: "quill.chat.streaming", "stream cancelled");
                    return Err(QuillError::Cancelled);
                }
                next = stream.next() => next,
            };

            let Some(event) = next else {
                break;
            };

            match accumulator.process_event(event?) {
                StreamEventResult::TextDelta(text) if forwarding => {
                    forwarding = forward(&events, ChatEvent::TextDelta(text), &cancel).await?;
                    if !forwarding {
                        tracing::debug!(
                            target: "quill.chat.streaming",
                            "event receiver closed, continuing without forwarding"
                        );
                    }
                }
                StreamEventResult::Error {
                    error_type,
                    message,
                } => {
                    return Err(
                        ApiError::StreamError(format!("{}: {}", error_type, message)).into(),
                    );
                }
                StreamEventResult::Complete => break,
                _ => {}
            }
        }

        let response = accumulator.finish()?;
        tracing::debug!(
            target: "quill.chat.streaming",
            blocks = response.content.len(),
            stop_reason = ?response.stop_reason,
            output_tokens = response.usage.output_tokens,
            "stream complete"
        );
        Ok(response)
    })
}
