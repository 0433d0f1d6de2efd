// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{QuillError, Result};

use super::{AnthropicConfig, Settings};

impl AnthropicConfig {
    /// Get the API key, checking the env var first.
    pub fn resolve_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

impl Settings {
    /// Get the API key for Anthropic, checking env var first.
    pub fn get_anthropic_api_key(&self) -> Option<String> {
        self.providers.anthropic.resolve_api_key()
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.streaming.channel_capacity == 0 {
            return Err(QuillError::Config(
                "streaming.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.defaults.max_tokens == 0 {
            return Err(QuillError::Config(
                "defaults.max_tokens must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.defaults.temperature) {
            return Err(QuillError::Config(format!(
                "defaults.temperature must be between 0.0 and 1.0, got {}",
                self.defaults.temperature
            )));
        }
        Ok(())
    }
}
