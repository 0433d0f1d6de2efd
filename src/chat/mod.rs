// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat orchestration
//!
//! [`ChatEngine`] owns the transcript and drives one user turn through model
//! calls and tool dispatch. Progress reaches the caller as [`ChatEvent`]s on
//! a bounded channel.

pub mod engine;
pub mod streaming;

pub use engine::{ChatEngine, TurnOutcome, TurnState};
pub use streaming::{spawn_stream_pump, AssistantResponse, StreamAccumulator, StreamEventResult};

/// Incremental output of a turn, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A fragment of model text
    TextDelta(String),
    /// The model asked for a tool to run
    ToolInvocation {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// A tool finished
    ToolResult {
        id: String,
        name: String,
        is_error: bool,
        output: String,
    },
}
