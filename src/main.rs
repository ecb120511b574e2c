#![deny(dead_code)]
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

mod utils;

use quillet::app::{App, AppEvent};
use quillet::config::{AppConfig, SimulationConfig};
use quillet::messenger::{StubMessenger, StubOptions};

/// Command line arguments for quillet
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Quillet: an in-memory one-to-one chat backend with a line-oriented shell.",
    long_about = "Quillet runs the simulated messaging backend and reads commands from stdin.\n\n\
    Results and events are printed to stdout as JSON lines. Type `help` for the command list."
)]
struct Args {
    /// JSON config file (defaults to <config dir>/quillet/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Override the configured log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Randomly toggle contact presence in the background
    #[arg(long)]
    presence: bool,

    /// Skip every simulated delay
    #[arg(long)]
    instant: bool,
}

const HELP: &str = "commands: profile | name <display name> | contacts | add <id> <name> | \
remove <id> | block <id> | unblock <id> | chats | send <id> <text> | \
history <id> [limit] [before-id] | read <id> | clear <id> | settings | theme <light|dark|system> | quit";

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}

/// Split off the first whitespace-separated word.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(i) => (&input[..i], input[i..].trim_start()),
        None => (input, ""),
    }
}

/// Run one shell command. Returns `Ok(false)` when the shell should exit.
async fn run_command(app: &App, line: &str) -> Result<bool> {
    let (cmd, rest) = split_word(line);
    match cmd {
        "" => {}
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        "profile" => print_json(&app.get_identity().await?),
        "name" => {
            app.update_profile(rest).await?;
            print_json(&app.get_identity().await?);
        }
        "contacts" => print_json(&app.get_contacts().await?),
        "add" => {
            let (id, name) = split_word(rest);
            print_json(&app.add_contact(id, name).await?);
        }
        "remove" => {
            app.delete_contact(rest.trim()).await?;
            print_json(&json!({ "removed": rest.trim() }));
        }
        "block" => {
            app.block_contact(rest.trim()).await?;
            print_json(&json!({ "blocked": rest.trim() }));
        }
        "unblock" => {
            app.unblock_contact(rest.trim()).await?;
            print_json(&json!({ "unblocked": rest.trim() }));
        }
        "chats" => print_json(&app.get_chat_summaries().await?),
        "send" => {
            let (id, text) = split_word(rest);
            print_json(&app.send_message(id, text).await?);
        }
        "history" => {
            let (id, rest) = split_word(rest);
            let (limit, before) = split_word(rest);
            let limit = if limit.is_empty() {
                0
            } else {
                i32::from_str(limit).with_context(|| format!("invalid limit '{}'", limit))?
            };
            print_json(&app.get_messages(id, limit, before.trim()).await?);
        }
        "read" => {
            app.mark_as_read(rest.trim()).await?;
            print_json(&json!({ "read": rest.trim() }));
        }
        "clear" => {
            app.clear_history(rest.trim()).await?;
            print_json(&json!({ "cleared": rest.trim() }));
        }
        "settings" => print_json(&app.get_settings().await?),
        "theme" => print_json(&app.set_theme(rest).await?),
        other => return Err(anyhow!("unknown command '{}' (try `help`)", other)),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file;
    }
    if args.instant {
        config.simulation = SimulationConfig::instant();
    }

    let level: LevelFilter = config.level_filter()?;
    utils::setup_logging(config.log_file.as_deref(), level)?;
    info!("System information: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    let messenger = Arc::new(StubMessenger::with_options(StubOptions {
        config: config.simulation.clone(),
        ..StubOptions::default()
    }));
    let app = App::new(messenger);
    let mut events = app.startup(args.presence);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => print_json::<AppEvent>(&event),
            line = lines.next_line() => {
                let line = match line.context("reading stdin")? {
                    Some(line) => line,
                    None => break,
                };
                match run_command(&app, &line).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => print_json(&json!({ "error": e.to_string() })),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    app.shutdown().await;
    info!("All background work stopped, exiting");
    Ok(())
}
