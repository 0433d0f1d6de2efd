// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Quill - chat with a model that can work on your files
//!
//! Entry point for the Quill CLI application.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use quill::chat::ChatEngine;
use quill::cli::{Cli, Commands, SettingsArgs, SettingsCommands};
use quill::config::Settings;
use quill::error::Result;
use quill::llm::providers::AnthropicProvider;
use quill::tools::{ToolContext, ToolExecutor};

#[path = "main/repl.rs"]
mod repl;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still takes precedence over -v
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    for directive in cli.log_directives() {
        if let Ok(parsed) = directive.parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let (settings_path, mut settings) = match &cli.config {
        Some(path) => (path.clone(), Settings::load_from(path)?),
        None => {
            Settings::ensure_directories()?;
            (Settings::default_path(), Settings::load()?)
        }
    };

    // Saved before flag overrides so they never end up in the file
    if let Some(Commands::Settings(SettingsArgs {
        command: SettingsCommands::Set { key, value },
    })) = &cli.command
    {
        settings.set_value(key, value)?;
        settings.save_to(&settings_path)?;
        println!("Setting '{}' updated in {}", key, settings_path.display());
        return Ok(());
    }
    cli.apply_overrides(&mut settings);

    match &cli.command {
        Some(Commands::Settings(args)) => match &args.command {
            SettingsCommands::Show => {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            SettingsCommands::Get { key } => println!("{}", settings.get_value(key)?),
            SettingsCommands::Set { .. } => {}
        },
        Some(Commands::Ask(args)) => {
            let mut engine = build_engine(&cli, settings)?;
            repl::run_ask(&mut engine, &args.prompt).await?;
        }
        Some(Commands::Chat) | None => {
            let mut engine = build_engine(&cli, settings)?;
            repl::run_chat(&mut engine).await?;
        }
    }

    Ok(())
}

fn build_engine(cli: &Cli, settings: Settings) -> Result<ChatEngine> {
    let working_directory = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    tracing::debug!(
        target: "quill.config",
        working_directory = %working_directory.display(),
        model = %settings.providers.anthropic.default_model,
        "building chat engine"
    );

    let provider = AnthropicProvider::from_config(&settings.providers.anthropic)?;
    let executor = ToolExecutor::new(ToolContext::new(working_directory));
    Ok(ChatEngine::new(Arc::new(provider), executor, settings))
}
