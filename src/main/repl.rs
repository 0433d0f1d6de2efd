// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Interactive chat loop and one-shot ask mode

use std::io::{self, Write};

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quill::chat::{ChatEngine, ChatEvent, TurnOutcome};
use quill::error::{QuillError, Result};

const SUMMARY_MAX_CHARS: usize = 80;

/// Run the REPL until `exit` or end of input
pub(super) async fn run_chat(engine: &mut ChatEngine) -> Result<()> {
    print_welcome(engine.model())?;

    loop {
        let Some(input) = read_user_input()? else {
            println!();
            break;
        };

        let prompt = match input.as_str() {
            "" => continue,
            "exit" | "quit" | "/exit" => break,
            "/clear" => {
                engine.clear();
                println!("Conversation cleared.\n");
                continue;
            }
            // Resume from the current transcript, e.g. after a failed model call
            "/retry" => "",
            text => text,
        };

        match run_turn(engine, prompt).await {
            Ok(_) => println!("\n"),
            Err(QuillError::Cancelled) => {
                let mut stdout = io::stdout();
                stdout.execute(SetForegroundColor(Color::Yellow))?;
                println!("\nInterrupted");
                stdout.execute(ResetColor)?;
                println!("Type your next message.\n");
            }
            Err(e) => print_error(&e)?,
        }
    }

    Ok(())
}

/// Send one prompt, print the streamed answer and exit
pub(super) async fn run_ask(engine: &mut ChatEngine, prompt: &str) -> Result<()> {
    run_turn(engine, prompt).await?;
    println!();
    Ok(())
}

/// Run a user turn with rendering on its own task and Ctrl-C wired to cancel
async fn run_turn(engine: &mut ChatEngine, input: &str) -> Result<TurnOutcome> {
    let (tx, rx) = mpsc::channel(engine.settings().streaming.channel_capacity);
    let cancel = CancellationToken::new();

    let renderer = tokio::spawn(async move {
        if let Err(e) = render_events(rx).await {
            tracing::warn!(target: "quill.chat.engine", error = %e, "rendering failed");
        }
    });
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = engine.submit_user_input(input, tx, &cancel).await;

    interrupt.abort();
    // The sender was moved into the engine, so the renderer sees the channel close
    let _ = renderer.await;

    result
}

async fn render_events(mut rx: mpsc::Receiver<ChatEvent>) -> Result<()> {
    let mut stdout = io::stdout();
    let mut in_text = false;

    while let Some(event) = rx.recv().await {
        match event {
            ChatEvent::TextDelta(text) => {
                if !in_text {
                    stdout.execute(SetForegroundColor(Color::Cyan))?;
                    print!("\nAssistant: ");
                    stdout.execute(ResetColor)?;
                    in_text = true;
                }
                print!("{}", text);
                stdout.flush()?;
            }
            ChatEvent::ToolInvocation { name, input, .. } => {
                in_text = false;
                println!();
                stdout.execute(SetForegroundColor(Color::DarkGrey))?;
                print!("  tool: ");
                stdout.execute(SetForegroundColor(Color::Magenta))?;
                print!("{}", name);
                stdout.execute(SetForegroundColor(Color::DarkGrey))?;
                println!("({})", summarize(&input.to_string(), SUMMARY_MAX_CHARS));
                stdout.execute(ResetColor)?;
            }
            ChatEvent::ToolResult {
                is_error, output, ..
            } => {
                if is_error {
                    stdout.execute(SetForegroundColor(Color::Red))?;
                    print!("  ✗ ");
                } else {
                    stdout.execute(SetForegroundColor(Color::Green))?;
                    print!("  ✓ ");
                }
                stdout.execute(ResetColor)?;
                let first_line = output.lines().next().unwrap_or_default();
                println!("{}", summarize(first_line, SUMMARY_MAX_CHARS));
            }
        }
    }

    Ok(())
}

fn print_welcome(model: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    print!("quill");
    stdout.execute(ResetColor)?;
    println!(" {} ({})", env!("CARGO_PKG_VERSION"), model);
    println!("Type 'exit' or press Ctrl-D to quit, '/clear' to start over, '/retry' after an error.\n");
    Ok(())
}

/// Prompt and read one line; `None` at end of input
fn read_user_input() -> Result<Option<String>> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Green))?;
    print!("You: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn print_error(error: &QuillError) -> Result<()> {
    let mut stderr = io::stderr();
    stderr.execute(SetForegroundColor(Color::Red))?;
    eprintln!("\nError: {}", error);
    stderr.execute(ResetColor)?;
    eprintln!();
    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`
fn summarize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
