// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Quill - a terminal chat front-end for LLMs with local file tools.
//!
//! Architecture highlights:
//! - `chat`: the conversation engine and the streaming pump
//! - `llm`: message model, provider trait, Anthropic and mock providers
//! - `tools`: the file tools, their registry and dispatcher, and the edit engine
//! - `config`: settings file and environment overrides
//! - `cli`: command-line arguments

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

pub use error::{QuillError, Result};
