// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Quill
//!
//! This module defines the error types shared across the crate. Edit
//! validation has its own enum in [`crate::tools::edit`].

use thiserror::Error;

use crate::tools::edit::EditError;

/// Main error type for Quill operations
#[derive(Error, Debug)]
pub enum QuillError {
    /// API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Tool execution errors
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Edit instruction rejected by the edit engine
    #[error("{0}")]
    Edit(#[from] EditError),

    /// The caller cancelled the turn in flight
    #[error("Turn cancelled")]
    Cancelled,
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// No API key configured or found in the environment
    #[error("No API key found: set {0} or providers.anthropic.api_key")]
    MissingApiKey(String),

    /// Rate limited by the API
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Streaming error
    #[error("Streaming error: {0}")]
    StreamError(String),
}

/// Result type alias for Quill operations
pub type Result<T> = std::result::Result<T, QuillError>;

impl QuillError {
    /// Whether this error came from the model call rather than local work.
    pub fn is_api(&self) -> bool {
        matches!(self, QuillError::Api(_) | QuillError::Http(_))
    }
}
