// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io;

use quill::error::{ApiError, QuillError};
use quill::tools::edit::{EditError, EditMode};

#[test]
fn test_io_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
    let error: QuillError = io_error.into();

    match error {
        QuillError::Io(_) => {}
        _ => panic!("Expected Io error, got different error type"),
    }
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: QuillError = json_error.into();
    assert!(error.to_string().starts_with("JSON error: "));
}

#[test]
fn test_config_error_display() {
    let error = QuillError::Config("Missing API key".to_string());
    assert_eq!(error.to_string(), "Configuration error: Missing API key");
}

#[test]
fn test_tool_execution_error() {
    let error = QuillError::ToolExecution("Command failed".to_string());
    assert_eq!(error.to_string(), "Tool execution failed: Command failed");
}

#[test]
fn test_cancelled_display() {
    assert_eq!(QuillError::Cancelled.to_string(), "Turn cancelled");
    assert!(!QuillError::Cancelled.is_api());
}

#[test]
fn test_api_errors_display() {
    assert_eq!(
        ApiError::RateLimited(30).to_string(),
        "Rate limited: retry after 30 seconds"
    );
    assert_eq!(
        ApiError::AuthenticationFailed.to_string(),
        "Authentication failed: invalid API key"
    );
    assert_eq!(
        ApiError::ServerError {
            status: 500,
            message: "Internal server error".to_string()
        }
        .to_string(),
        "API error (500): Internal server error"
    );
    assert_eq!(
        ApiError::MissingApiKey("ANTHROPIC_API_KEY".to_string()).to_string(),
        "No API key found: set ANTHROPIC_API_KEY or providers.anthropic.api_key"
    );
}

#[test]
fn test_api_error_wraps_into_quill_error() {
    let error: QuillError = ApiError::StreamError("overloaded_error: Overloaded".to_string()).into();
    assert!(error.is_api());
    assert_eq!(
        error.to_string(),
        "API error: Streaming error: overloaded_error: Overloaded"
    );
}

#[test]
fn test_edit_error_passes_through_unchanged() {
    let error: QuillError = EditError::MissingField {
        field: "old_text",
        mode: EditMode::Replace,
    }
    .into();
    assert_eq!(error.to_string(), "old_text is required for replace mode");

    let error: QuillError = EditError::LineOutOfRange { line: 9, count: 3 }.into();
    assert_eq!(error.to_string(), "line_number 9 is out of range (1-3)");
}
