// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

/// Quill - chat with a model that can work on your files
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about = "Chat with a model that can work on your files")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Working directory for file tools (defaults to current)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Settings file path (defaults to $QUILL_HOME/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Model to use instead of the configured default
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Disable streaming responses
    #[arg(long, global = true)]
    pub no_stream: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive chat session (default when no command given)
    Chat,

    /// Ask a single question (non-interactive)
    Ask(AskArgs),

    /// Inspect or change configuration
    #[command(alias = "config")]
    Settings(SettingsArgs),
}

/// Arguments for the ask subcommand
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The prompt to send
    pub prompt: String,
}

/// Arguments for the settings subcommand
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommands,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the effective settings as JSON
    Show,

    /// Print one configuration value
    Get {
        /// Configuration key (e.g. "model", "max_tokens")
        key: String,
    },

    /// Set a configuration value and save the settings file
    Set {
        /// Configuration key (e.g. "model", "max_tokens")
        key: String,

        /// Value to set; empty clears optional values
        value: String,
    },
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.providers.anthropic.default_model = model.clone();
        }
        if self.no_stream {
            settings.defaults.stream = false;
        }
    }

    /// Extra `tracing` directives for the requested verbosity
    pub fn log_directives(&self) -> &'static [&'static str] {
        match self.verbose {
            0 => &[],
            1 => &["quill.chat.engine=debug", "quill.tools.executor=debug"],
            _ => &[
                "quill.chat.engine=trace",
                "quill.chat.streaming=debug",
                "quill.tools.executor=debug",
                "quill.llm.anthropic=debug",
                "quill.config=debug",
            ],
        }
    }
}
