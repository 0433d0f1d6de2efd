// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quill::error::{ApiError, QuillError};
use quill::llm::message::{ContentBlock, Conversation, Message, Role};
use quill::llm::mock_provider::{MockProvider, MockResponse, MockStep};
use quill::llm::provider::{CompletionRequest, LlmProvider, StopReason, StreamEvent};
use quill::llm::providers::AnthropicProvider;

fn sse(frames: &[(&str, serde_json::Value)]) -> String {
    frames
        .iter()
        .map(|(event, data)| format!("event: {}\ndata: {}\n\n", event, data))
        .collect()
}

fn tool_stream_body() -> String {
    sse(&[
        (
            "message_start",
            json!({"type": "message_start", "message": {"id": "msg_1", "usage": {"input_tokens": 12, "output_tokens": 1}}}),
        ),
        (
            "content_block_start",
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        ),
        ("ping", json!({"type": "ping"})),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Let me "}}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "look."}}),
        ),
        (
            "content_block_stop",
            json!({"type": "content_block_stop", "index": 0}),
        ),
        (
            "content_block_start",
            json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_01", "name": "read_file", "input": {}}}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"path\": \"a"}}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": ".txt\"}"}}),
        ),
        (
            "content_block_stop",
            json!({"type": "content_block_stop", "index": 1}),
        ),
        (
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 30}}),
        ),
        ("message_stop", json!({"type": "message_stop"})),
    ])
}

fn request() -> CompletionRequest {
    CompletionRequest::new("claude-test", vec![Message::user("read a.txt")])
}

#[test]
fn test_message_constructors() {
    let user = Message::user("Hello, world!");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.text(), "Hello, world!");

    let assistant = Message::assistant_blocks(vec![
        ContentBlock::Text {
            text: "Reading".to_string(),
        },
        ContentBlock::ToolUse {
            id: "t1".to_string(),
            name: "read_file".to_string(),
            input: json!({"path": "a.txt"}),
        },
    ]);
    assert_eq!(assistant.role, Role::Assistant);
    assert!(assistant.has_tool_use());
    assert_eq!(assistant.tool_uses()[0].1, "read_file");
}

#[test]
fn test_conversation_truncate_restores_length() {
    let mut conversation = Conversation::with_system("Be helpful.");
    conversation.push(Message::user("one"));
    conversation.push(Message::assistant("two"));
    conversation.push(Message::user("three"));

    conversation.truncate(1);
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation.system_prompt.as_deref(), Some("Be helpful."));
}

#[test]
fn test_tool_result_serializes_error_flag_only_when_set() {
    let ok = serde_json::to_value(ContentBlock::ToolResult {
        tool_use_id: "t".to_string(),
        content: "fine".to_string(),
        is_error: false,
    })
    .unwrap();
    assert!(ok.get("is_error").is_none());

    let failed = serde_json::to_value(ContentBlock::ToolResult {
        tool_use_id: "t".to_string(),
        content: "tool not found".to_string(),
        is_error: true,
    })
    .unwrap();
    assert_eq!(failed["is_error"], true);
}

#[tokio::test]
async fn test_mock_provider_streams_scripted_reply() {
    let provider = MockProvider::scripted(vec![MockStep::Reply(
        MockResponse::text("scripted words").and_tool_call("t1", "list_files", json!({})),
    )]);

    let events: Vec<StreamEvent> = provider
        .complete_stream(request())
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::TextDelta { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "scripted words");
    assert!(matches!(
        events.last(),
        Some(StreamEvent::TurnComplete {
            stop_reason: Some(StopReason::ToolUse),
            ..
        })
    ));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_anthropic_stream_decodes_text_and_tool_use() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(tool_stream_body()),
        )
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::with_base_url(
        "test-key",
        format!("{}/v1/messages", mock_server.uri()),
    );
    let events: Vec<StreamEvent> = provider
        .complete_stream(request())
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Ping,
            StreamEvent::TextDelta {
                index: 0,
                text: "Let me ".to_string()
            },
            StreamEvent::TextDelta {
                index: 0,
                text: "look.".to_string()
            },
            StreamEvent::ToolUseStarted {
                index: 1,
                id: "toolu_01".to_string(),
                name: "read_file".to_string()
            },
            StreamEvent::ToolInputDelta {
                index: 1,
                partial_json: "{\"path\": \"a".to_string()
            },
            StreamEvent::ToolInputDelta {
                index: 1,
                partial_json: ".txt\"}".to_string()
            },
            StreamEvent::TurnComplete {
                stop_reason: Some(StopReason::ToolUse),
                usage: quill::llm::provider::Usage {
                    input_tokens: 12,
                    output_tokens: 30
                }
            },
        ]
    );
}

#[tokio::test]
async fn test_anthropic_request_body_carries_stream_flag_and_tools() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse(&[("message_stop", json!({"type": "message_stop"}))])),
        )
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::with_base_url("k", mock_server.uri());
    let registry = quill::tools::ToolRegistry::with_builtins();
    let request = request()
        .with_system("Be brief.")
        .with_tools(registry.definitions());
    let _ = provider
        .complete_stream(request)
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await;

    let received = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["stream"], true);
    assert_eq!(body["model"], "claude-test");
    assert_eq!(body["system"], "Be brief.");
    assert_eq!(body["tools"].as_array().unwrap().len(), 6);
    assert_eq!(body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_anthropic_complete_parses_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_9",
            "model": "claude-test",
            "content": [{"type": "text", "text": "Hi!"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 3, "output_tokens": 2}
        })))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::with_base_url("k", mock_server.uri());
    let response = provider.complete(request()).await.unwrap();

    assert_eq!(response.id, "msg_9");
    assert_eq!(
        response.content,
        vec![ContentBlock::Text {
            text: "Hi!".to_string()
        }]
    );
    assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    assert_eq!(response.usage.total_tokens(), 5);
}

#[tokio::test]
async fn test_anthropic_rate_limit_uses_retry_after() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({
                    "type": "error",
                    "error": {"type": "rate_limit_error", "message": "slow down"}
                })),
        )
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::with_base_url("k", mock_server.uri());
    let err = provider.complete_stream(request()).await.err().unwrap();
    assert!(matches!(err, QuillError::Api(ApiError::RateLimited(7))));
}

#[tokio::test]
async fn test_anthropic_auth_and_server_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-api-key", "bad"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-api-key", "good"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .mount(&mock_server)
        .await;

    let bad = AnthropicProvider::with_base_url("bad", mock_server.uri());
    let err = bad.complete(request()).await.unwrap_err();
    assert!(matches!(err, QuillError::Api(ApiError::AuthenticationFailed)));

    let good = AnthropicProvider::with_base_url("good", mock_server.uri());
    match good.complete(request()).await.unwrap_err() {
        QuillError::Api(ApiError::ServerError { status, message }) => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}
