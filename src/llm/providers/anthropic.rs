// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Anthropic Claude API provider implementation
//!
//! Implements the LlmProvider trait for the Messages API. Streaming responses
//! arrive as server-sent events and are folded into [`StreamEvent`]s by
//! [`SseDecoder`].

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AnthropicConfig;
use crate::error::{ApiError, QuillError, Result};
use crate::llm::message::{ContentBlock, Message, Role};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, EventStream, LlmProvider, StopReason, StreamEvent,
    ToolChoice, ToolDefinition, Usage,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, ANTHROPIC_API_URL)
    }

    /// Create with a custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Create from settings, resolving the API key
    pub fn from_config(config: &AnthropicConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ApiError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(match &config.base_url {
            Some(url) => Self::with_base_url(api_key, url),
            None => Self::new(api_key),
        })
    }

    /// Convert internal messages to Anthropic format.
    ///
    /// Empty turns are dropped and consecutive turns from the same role are
    /// merged, since the API rejects both.
    fn convert_messages(&self, messages: &[Message]) -> Vec<AnthropicMessage> {
        let mut converted: Vec<AnthropicMessage> = Vec::with_capacity(messages.len());

        for m in messages.iter().filter(|m| !m.content.is_empty()) {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };

            let content = m.content.iter().map(|b| match b {
                ContentBlock::Text { text } => AnthropicContentBlock::Text { text: text.clone() },
                ContentBlock::ToolUse { id, name, input } => AnthropicContentBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                },
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => AnthropicContentBlock::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: content.clone(),
                    is_error: is_error.then_some(true),
                },
            });

            match converted.last_mut().filter(|previous| previous.role == role) {
                Some(previous) => previous.content.extend(content),
                None => converted.push(AnthropicMessage {
                    role: role.to_string(),
                    content: content.collect(),
                }),
            }
        }

        converted
    }

    /// Convert tools to Anthropic format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: serde_json::json!({
                    "type": t.input_schema.schema_type,
                    "properties": t.input_schema.properties,
                    "required": t.input_schema.required,
                }),
            })
            .collect()
    }

    /// Build the request body
    fn build_request(&self, request: &CompletionRequest, stream: bool) -> AnthropicRequest {
        let tool_choice = if request.tools.is_empty() {
            None
        } else {
            match &request.tool_choice {
                ToolChoice::Auto => Some(AnthropicToolChoice::Auto),
                ToolChoice::None => None,
                ToolChoice::Required => Some(AnthropicToolChoice::Any),
                ToolChoice::Specific(name) => {
                    Some(AnthropicToolChoice::Tool { name: name.clone() })
                }
            }
        };

        AnthropicRequest {
            model: request.model.clone(),
            messages: self.convert_messages(&request.messages),
            system: request.system.clone(),
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(self.convert_tools(&request.tools))
            },
            tool_choice,
            stream,
        }
    }

    async fn send(&self, body: &AnthropicRequest) -> Result<reqwest::Response> {
        tracing::debug!(
            target: "quill.llm.anthropic",
            model = %body.model,
            messages = body.messages.len(),
            stream = body.stream,
            "sending request"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| QuillError::Api(ApiError::Network(e.to_string())))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            // Extract Retry-After header before consuming response body
            let retry_after = Self::extract_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(target: "quill.llm.anthropic", status, "request rejected");
            return Err(self.parse_error(status, &body, retry_after));
        }

        Ok(response)
    }

    /// Extract the numeric form of the Retry-After header
    fn extract_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    }

    /// Parse an error response
    fn parse_error(&self, status: u16, body: &str, retry_after: Option<u64>) -> QuillError {
        match serde_json::from_str::<AnthropicError>(body) {
            Ok(error_response) => match error_response.error.error_type.as_str() {
                "authentication_error" => QuillError::Api(ApiError::AuthenticationFailed),
                "rate_limit_error" => {
                    // Default to 10 seconds when the header is absent
                    let retry_secs = u32::try_from(retry_after.unwrap_or(10)).unwrap_or(u32::MAX);
                    QuillError::Api(ApiError::RateLimited(retry_secs))
                }
                _ => QuillError::Api(ApiError::ServerError {
                    status,
                    message: error_response.error.message,
                }),
            },
            Err(_) => QuillError::Api(ApiError::ServerError {
                status,
                message: body.to_string(),
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request, false);
        let response = self.send(&body).await?;

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| QuillError::Api(ApiError::InvalidResponse(e.to_string())))?;

        let content = api_response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(ContentBlock::Text { text }),
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                // Never produced by the model
                AnthropicContentBlock::ToolResult { .. } => None,
            })
            .collect();

        Ok(CompletionResponse {
            id: api_response.id,
            model: api_response.model,
            content,
            stop_reason: api_response.stop_reason.as_deref().map(parse_stop_reason),
            usage: Usage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream> {
        let body = self.build_request(&request, true);
        let response = self.send(&body).await?;

        let event_stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, result| {
                let events = match result {
                    Ok(bytes) => decoder.feed(&bytes),
                    Err(e) => vec![Err(QuillError::Api(ApiError::StreamError(e.to_string())))],
                };
                futures::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(event_stream))
    }
}

fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "max_tokens" => StopReason::MaxTokens,
        "tool_use" => StopReason::ToolUse,
        "stop_sequence" => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

/// Incremental decoder for the Messages API event stream.
///
/// Frames are `event:`/`data:` line pairs separated by a blank line. Bytes may
/// be split anywhere, including inside a UTF-8 sequence, so undecoded input is
/// buffered until a full frame is available. The stop reason and usage carried
/// by `message_delta` are held back and reported with the `TurnComplete` that
/// `message_stop` produces.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    stop_reason: Option<StopReason>,
    usage: Usage,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamEvent>> {
        self.buffer.extend(bytes.iter().filter(|b| **b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let frame: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            let frame = String::from_utf8_lossy(&frame[..pos]);
            match self.decode_frame(&frame) {
                Ok(Some(event)) => events.push(Ok(event)),
                Ok(None) => {}
                Err(e) => events.push(Err(e)),
            }
        }
        events
    }

    fn decode_frame(&mut self, frame: &str) -> Result<Option<StreamEvent>> {
        let mut event_type = None;
        let mut data = None;

        for line in frame.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                event_type = Some(rest.trim());
            } else if let Some(rest) = line.strip_prefix("data:") {
                data = Some(rest.trim());
            }
        }

        let Some(event_type) = event_type else {
            return Ok(None);
        };
        let parse = |data: Option<&str>| -> Result<serde_json::Value> {
            serde_json::from_str(data.unwrap_or_default()).map_err(|e| {
                QuillError::Api(ApiError::StreamError(format!(
                    "malformed {} event: {}",
                    event_type, e
                )))
            })
        };

        match event_type {
            "message_start" => {
                let parsed = parse(data)?;
                if let Some(input) = parsed["message"]["usage"]["input_tokens"].as_u64() {
                    self.usage.input_tokens = input as u32;
                }
                Ok(None)
            }
            "content_block_start" => {
                let parsed = parse(data)?;
                let index = block_index(&parsed, event_type)?;
                let block = &parsed["content_block"];
                match block["type"].as_str() {
                    Some("tool_use") => Ok(Some(StreamEvent::ToolUseStarted {
                        index,
                        id: block["id"].as_str().unwrap_or_default().to_string(),
                        name: block["name"].as_str().unwrap_or_default().to_string(),
                    })),
                    Some("text") => Ok(block["text"]
                        .as_str()
                        .filter(|text| !text.is_empty())
                        .map(|text| StreamEvent::TextDelta {
                            index,
                            text: text.to_string(),
                        })),
                    _ => Ok(None),
                }
            }
            "content_block_delta" => {
                let parsed = parse(data)?;
                let index = block_index(&parsed, event_type)?;
                let delta = &parsed["delta"];
                match delta["type"].as_str() {
                    Some("text_delta") => Ok(Some(StreamEvent::TextDelta {
                        index,
                        text: delta["text"].as_str().unwrap_or_default().to_string(),
                    })),
                    Some("input_json_delta") => Ok(Some(StreamEvent::ToolInputDelta {
                        index,
                        partial_json: delta["partial_json"]
                            .as_str()
                            .unwrap_or_default()
                            .to_string(),
                    })),
                    _ => Ok(None),
                }
            }
            "message_delta" => {
                let parsed = parse(data)?;
                if let Some(reason) = parsed["delta"]["stop_reason"].as_str() {
                    self.stop_reason = Some(parse_stop_reason(reason));
                }
                if let Some(output) = parsed["usage"]["output_tokens"].as_u64() {
                    self.usage.output_tokens = output as u32;
                }
                Ok(None)
            }
            "message_stop" => Ok(Some(StreamEvent::TurnComplete {
                stop_reason: self.stop_reason.take(),
                usage: std::mem::take(&mut self.usage),
            })),
            "ping" => Ok(Some(StreamEvent::Ping)),
            "error" => {
                let parsed = parse(data)?;
                Ok(Some(StreamEvent::Error {
                    error_type: parsed["error"]["type"]
                        .as_str()
                        .unwrap_or("unknown_error")
                        .to_string(),
                    message: parsed["error"]["message"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                }))
            }
            // content_block_stop and future event types carry nothing we need
            _ => Ok(None),
        }
    }
}

fn block_index(parsed: &serde_json::Value, event_type: &str) -> Result<usize> {
    parsed["index"].as_u64().map(|i| i as usize).ok_or_else(|| {
        QuillError::Api(ApiError::StreamError(format!(
            "{} event without index",
            event_type
        )))
    })
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<AnthropicToolChoice>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicToolChoice {
    Auto,
    Any,
    Tool { name: String },
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
