// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation orchestration
//!
//! One call to [`ChatEngine::submit_user_input`] runs a user turn to
//! completion: model call, streamed response, tool dispatch, and another
//! model call for as long as the model keeps asking for tools. A failed or
//! cancelled turn never leaves a partial model turn behind: completed tool
//! round trips are kept, and a turn that got no model answer at all is
//! undone.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::{ApiError, QuillError, Result};
use crate::llm::message::{ContentBlock, Conversation, Message, Role};
use crate::llm::provider::{CompletionRequest, LlmProvider};
use crate::tools::{ToolExecutor, ToolResult};

use super::streaming::{forward, spawn_stream_pump, AssistantResponse};
use super::ChatEvent;

/// Where a user turn is in its request/stream/dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingModel,
    Streaming,
    DispatchingTools,
    Done,
}

/// Summary of a completed user turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Messages added to the transcript
    pub appended: usize,
    /// Model text produced during the turn
    pub text: String,
    /// Completed tool dispatch rounds
    pub round_trips: usize,
}

/// A model call that has been accepted
enum PendingResponse {
    Stream(JoinHandle<Result<AssistantResponse>>),
    Complete(AssistantResponse),
}

enum Step {
    AwaitingModel,
    Streaming(PendingResponse),
    DispatchingTools(Message),
    Done,
}

impl Step {
    fn state(&self) -> TurnState {
        match self {
            Step::AwaitingModel => TurnState::AwaitingModel,
            Step::Streaming(_) => TurnState::Streaming,
            Step::DispatchingTools(_) => TurnState::DispatchingTools,
            Step::Done => TurnState::Done,
        }
    }
}

/// Drives a single conversation against a model provider
pub struct ChatEngine {
    provider: Arc<dyn LlmProvider>,
    executor: ToolExecutor,
    settings: Settings,
    model: String,
    conversation: Conversation,
}

impl ChatEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, executor: ToolExecutor, settings: Settings) -> Self {
        let conversation = match &settings.defaults.system_prompt {
            Some(prompt) => Conversation::with_system(prompt.clone()),
            None => Conversation::new(),
        };
        let model = settings.providers.anthropic.default_model.clone();

        Self {
            provider,
            executor,
            settings,
            model,
            conversation,
        }
    }

    /// Use `model` instead of the configured default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The transcript so far
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Forget the transcript, keeping the system prompt
    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Run one user turn to completion.
    ///
    /// Text fragments and tool activity are sent on `events` as they happen;
    /// the channel closes when this returns. An empty `text` appends nothing
    /// and continues from the current transcript, which is how a caller
    /// resumes after an error that interrupted a tool round trip.
    pub async fn submit_user_input(
        &mut self,
        text: &str,
        events: mpsc::Sender<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let entry_len = self.conversation.len();
        let entry_tail = self.conversation.last().map(|m| m.content.len());

        tracing::info!(
            target: "quill.chat.engine",
            model = %self.model,
            stream = self.settings.defaults.stream,
            message_count = entry_len,
            "turn start"
        );

        let result = self.run_turn(text, &events, cancel).await;

        match &result {
            Ok(outcome) => tracing::info!(
                target: "quill.chat.engine",
                appended = outcome.appended,
                round_trips = outcome.round_trips,
                "turn complete"
            ),
            Err(error) => {
                let answered = self.conversation.messages[entry_len..]
                    .iter()
                    .any(|m| m.role == Role::Assistant);
                if !answered {
                    self.rollback(entry_len, entry_tail);
                }
                tracing::warn!(
                    target: "quill.chat.engine",
                    error = %error,
                    rolled_back = !answered,
                    message_count = self.conversation.len(),
                    "turn failed"
                );
            }
        }

        result
    }

    async fn run_turn(
        &mut self,
        text: &str,
        events: &mpsc::Sender<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let entry_len = self.conversation.len();
        if !text.is_empty() {
            self.push_user_text(text);
        }

        let mut outcome = TurnOutcome::default();
        let mut turn: usize = 0;
        let mut step = Step::AwaitingModel;

        loop {
            tracing::trace!(target: "quill.chat.engine", state = ?step.state(), turn);

            step = match step {
                Step::AwaitingModel => {
                    turn += 1;
                    Step::Streaming(self.start_model_call(events, cancel).await?)
                }
                Step::Streaming(pending) => {
                    let response = match pending {
                        PendingResponse::Stream(handle) => handle.await.map_err(|e| {
                            QuillError::from(ApiError::StreamError(format!(
                                "stream task failed: {}",
                                e
                            )))
                        })??,
                        PendingResponse::Complete(response) => response,
                    };

                    tracing::debug!(
                        target: "quill.chat.engine",
                        turn,
                        response_blocks = response.content.len(),
                        stop_reason = ?response.stop_reason,
                        "received model response"
                    );

                    outcome.text.push_str(&response.text());
                    // Appended even when empty so user and model turns keep alternating
                    let message = response.into_message();
                    self.conversation.push(message.clone());
                    if message.has_tool_use() {
                        Step::DispatchingTools(message)
                    } else {
                        Step::Done
                    }
                }
                Step::DispatchingTools(message) => {
                    let results = self.dispatch_tools(&message, events, cancel).await?;
                    self.conversation
                        .push(ToolExecutor::results_to_message(results));
                    outcome.round_trips += 1;
                    Step::AwaitingModel
                }
                Step::Done => break,
            };
        }

        outcome.appended = self.conversation.len() - entry_len;
        Ok(outcome)
    }

    /// Add user text, joining a trailing tool-result turn left by an
    /// interrupted round trip instead of starting a second user turn.
    fn push_user_text(&mut self, text: &str) {
        let trailing_user = self
            .conversation
            .messages
            .last_mut()
            .filter(|last| last.role == Role::User);
        match trailing_user {
            Some(last) => last.content.push(ContentBlock::Text {
                text: text.to_string(),
            }),
            None => self.conversation.push(Message::user(text)),
        }
    }

    /// Restore the transcript to its shape at turn entry
    fn rollback(&mut self, entry_len: usize, entry_tail: Option<usize>) {
        self.conversation.truncate(entry_len);
        if let (Some(last), Some(blocks)) = (self.conversation.messages.last_mut(), entry_tail) {
            last.content.truncate(blocks);
        }
    }

    fn build_request(&self) -> CompletionRequest {
        let defaults = &self.settings.defaults;
        let request = CompletionRequest::new(&self.model, self.conversation.messages.clone())
            .with_max_tokens(defaults.max_tokens)
            .with_temperature(defaults.temperature)
            .with_tools(self.executor.tool_definitions());

        match &self.conversation.system_prompt {
            Some(system) => request.with_system(system.clone()),
            None => request,
        }
    }

    /// Issue the model call, retrying while rate limited.
    async fn start_model_call(
        &self,
        events: &mpsc::Sender<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<PendingResponse> {
        let stream = self.settings.defaults.stream;
        let max_retries = self.settings.resilience.max_retries;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let request = self.build_request();

            tracing::debug!(
                target: "quill.chat.engine",
                model = %request.model,
                attempt,
                stream,
                message_count = request.messages.len(),
                tool_count = request.tools.len(),
                "requesting model completion"
            );

            let result = if stream {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(QuillError::Cancelled),
                    result = self.provider.complete_stream(request) => result.map(|source| {
                        PendingResponse::Stream(spawn_stream_pump(
                            source,
                            events.clone(),
                            cancel.clone(),
                        ))
                    }),
                }
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(QuillError::Cancelled),
                    result = self.provider.complete(request) => result.map(|r| {
                        PendingResponse::Complete(AssistantResponse::from(r))
                    }),
                }
            };

            match result {
                Ok(PendingResponse::Complete(response)) => {
                    let text = response.text();
                    if !text.is_empty() {
                        forward(events, ChatEvent::TextDelta(text), cancel).await?;
                    }
                    return Ok(PendingResponse::Complete(response));
                }
                Ok(pending) => return Ok(pending),
                Err(QuillError::Api(ApiError::RateLimited(retry_after)))
                    if attempt <= max_retries =>
                {
                    let delay = self
                        .settings
                        .resilience
                        .backoff(attempt, (retry_after > 0).then_some(retry_after));

                    tracing::warn!(
                        target: "quill.chat.engine",
                        model = %self.model,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited; retrying request"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(QuillError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run every tool use in `message`, one at a time, in order.
    async fn dispatch_tools(
        &self,
        message: &Message,
        events: &mpsc::Sender<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolResult>> {
        let tool_uses = message.tool_uses();
        tracing::info!(
            target: "quill.chat.engine",
            tool_calls = tool_uses.len(),
            "entering tool execution phase"
        );

        let mut results = Vec::with_capacity(tool_uses.len());
        for (id, name, input) in tool_uses {
            if cancel.is_cancelled() {
                return Err(QuillError::Cancelled);
            }

            forward(
                events,
                ChatEvent::ToolInvocation {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: input.clone(),
                },
                cancel,
            )
            .await?;

            let result = self.executor.execute_tool_use(id, name, input.clone()).await;

            forward(
                events,
                ChatEvent::ToolResult {
                    id: id.to_string(),
                    name: name.to_string(),
                    is_error: result.is_error(),
                    output: result.output_text().to_string(),
                },
                cancel,
            )
            .await?;

            results.push(result);
        }

        Ok(results)
    }
}
