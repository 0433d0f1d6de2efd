// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for Quill
//!
//! Provides the message model and the abstraction over the remote model call.

pub mod message;
pub mod mock_provider;
pub mod provider;
pub mod providers;

pub use message::*;
pub use provider::*;
