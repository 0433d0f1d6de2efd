// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::migration;
use super::Settings;

impl Settings {
    /// Get the default settings file path.
    pub fn default_path() -> PathBuf {
        Self::quill_home().join("settings.json")
    }

    /// Load settings from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(target: "quill.config", path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path, merging with existing file content
    /// to preserve keys this version does not know about.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let new_value = serde_json::to_value(self)?;

        let merged = if path.exists() {
            let existing_content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<serde_json::Value>(&existing_content) {
                Ok(existing_value) => migration::deep_merge(existing_value, new_value),
                Err(_) => new_value, // Corrupt file, overwrite entirely.
            }
        } else {
            new_value
        };

        let content = serde_json::to_string_pretty(&merged)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the quill home directory (~/.quill or $QUILL_HOME).
    pub fn quill_home() -> PathBuf {
        if let Ok(home) = std::env::var("QUILL_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quill")
    }

    /// Ensure the settings directory exists.
    pub fn ensure_directories() -> Result<()> {
        let home = Self::quill_home();
        if !home.exists() {
            std::fs::create_dir_all(&home)?;
        }
        Ok(())
    }
}
