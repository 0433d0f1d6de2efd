// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{QuillError, Result};

use super::Settings;

/// Keys accepted by `settings get` and `settings set`
pub const SETTING_KEYS: [&str; 9] = [
    "model",
    "temperature",
    "max_tokens",
    "stream",
    "system_prompt",
    "api_key_env",
    "base_url",
    "channel_capacity",
    "max_retries",
];

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| QuillError::InvalidInput(format!("Invalid value for {}: '{}'", key, value)))
}

fn unknown(key: &str) -> QuillError {
    QuillError::InvalidInput(format!(
        "Unknown setting: {} (expected one of {})",
        key,
        SETTING_KEYS.join(", ")
    ))
}

impl Settings {
    /// Read one setting as text. Unset optional values read as an empty string.
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "model" => self.providers.anthropic.default_model.clone(),
            "temperature" => self.defaults.temperature.to_string(),
            "max_tokens" => self.defaults.max_tokens.to_string(),
            "stream" => self.defaults.stream.to_string(),
            "system_prompt" => self.defaults.system_prompt.clone().unwrap_or_default(),
            "api_key_env" => self.providers.anthropic.api_key_env.clone(),
            "base_url" => self.providers.anthropic.base_url.clone().unwrap_or_default(),
            "channel_capacity" => self.streaming.channel_capacity.to_string(),
            "max_retries" => self.resilience.max_retries.to_string(),
            _ => return Err(unknown(key)),
        };
        Ok(value)
    }

    /// Change one setting from text, then validate the result.
    ///
    /// An empty value clears `system_prompt` and `base_url`. On error the
    /// settings are left unchanged.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "model" => updated.providers.anthropic.default_model = value.to_string(),
            "temperature" => updated.defaults.temperature = parse(key, value)?,
            "max_tokens" => updated.defaults.max_tokens = parse(key, value)?,
            "stream" => updated.defaults.stream = parse(key, value)?,
            "system_prompt" => {
                updated.defaults.system_prompt = (!value.is_empty()).then(|| value.to_string())
            }
            "api_key_env" => updated.providers.anthropic.api_key_env = value.to_string(),
            "base_url" => {
                updated.providers.anthropic.base_url = (!value.is_empty()).then(|| value.to_string())
            }
            "channel_capacity" => updated.streaming.channel_capacity = parse(key, value)?,
            "max_retries" => updated.resilience.max_retries = parse(key, value)?,
            _ => return Err(unknown(key)),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
