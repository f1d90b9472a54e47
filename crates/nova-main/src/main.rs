// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of NOVA.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;
mod input;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use nova_core::{AudioSink, ChatOutcome, ClientSession, PollOutcome};
use nova_gateway::{AudioPayload, BackendClient};
use nova_types::{ClientConfig, ConnectivityState};

use crate::config::AppConfig;
use crate::input::{HELP, Input, parse_input};

#[derive(Debug, Parser)]
#[command(name = "nova", version, about = "NOVA smart-home client")]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the configuration
    #[arg(long)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Run,
    /// Poll once, print the dashboard and exit
    Status,
    /// Send one chat message and print the reply
    Send {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

/// Saves spoken replies so they can be played with any audio player
#[derive(Debug)]
struct ReplyFileSink {
    dir: PathBuf,
}

impl AudioSink for ReplyFileSink {
    fn play(&self, audio: AudioPayload) {
        let extension = match audio.content_type.as_deref() {
            Some(t) if t.contains("mpeg") => "mp3",
            Some(t) if t.contains("ogg") => "ogg",
            Some(_) | None => "wav",
        };
        let path = self.dir.join(format!("nova-reply.{extension}"));
        match std::fs::write(&path, &audio.bytes) {
            Ok(()) => info!("🔊 Spoken reply saved to {}", path.display()),
            Err(e) => warn!("Failed to save spoken reply to {}: {}", path.display(), e),
        }
    }
}

/// Install logging before anything else runs, at `RUST_LOG` or `info`.
/// The returned handle swaps in the configured level once it is known.
fn init_logging() -> Result<reload::Handle<EnvFilter, Registry>> {
    let (filter, handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(handle)
}

/// Filter to apply after configuration loads. `RUST_LOG` wins over the
/// configured level, in which case the startup filter stays.
fn configured_directive(rust_log: Option<&str>, log_level: &str) -> Option<String> {
    match rust_log.map(str::trim) {
        Some(directive) if !directive.is_empty() => None,
        Some(_) | None => Some(log_level.trim().to_lowercase()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_filter = init_logging()?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        config.backend.url = url;
        config.validate()?;
    }

    let rust_log = std::env::var("RUST_LOG").ok();
    if let Some(directive) = configured_directive(rust_log.as_deref(), &config.system.log_level) {
        log_filter
            .reload(EnvFilter::new(&directive))
            .context("Failed to apply configured log level")?;
        debug!("Log level set to {}", directive);
    }

    info!("🚀 Starting NOVA client");
    info!("📋 Configuration Summary:");
    info!("   Backend: {}", config.backend.url);
    info!("   Poll interval: {}ms", config.polling.interval_ms);
    info!(
        "   Override timeout: {}ms (revert on failure: {})",
        config.commands.override_timeout_ms, config.commands.revert_on_failure
    );
    info!("   Chat replies: {}", config.chat.reply_target);

    let backend = BackendClient::with_timeout(config.backend.url.clone(), config.request_timeout())
        .context("Failed to create backend client")?;
    let session = Arc::new(ClientSession::with_audio_sink(
        Arc::new(backend),
        ClientConfig::from(&config),
        Arc::new(ReplyFileSink {
            dir: std::env::temp_dir(),
        }),
    ));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_interactive(&session).await,
        Command::Status => print_status(&session).await,
        Command::Send { text } => send_once(&session, &text.join(" ")).await,
    }
}

async fn print_status(session: &ClientSession) -> Result<()> {
    let outcome = session.refresh().await;
    println!("{}", render::dashboard(&session.render()));
    if outcome == PollOutcome::Failed {
        let error = session.view().last_error.unwrap_or_default();
        anyhow::bail!("Backend unreachable: {error}");
    }
    Ok(())
}

async fn send_once(session: &ClientSession, text: &str) -> Result<()> {
    let ticket = session
        .send_chat(text)
        .context("Message was not sent")?;
    match ticket.outcome().await {
        ChatOutcome::Replied(reply) => {
            println!("{}", render::chat_line(&reply));
            Ok(())
        }
        ChatOutcome::Failed(reply) => {
            println!("{}", render::chat_line(&reply));
            anyhow::bail!("Assistant request failed")
        }
        ChatOutcome::Discarded => Ok(()),
    }
}

async fn run_interactive(session: &Arc<ClientSession>) -> Result<()> {
    let mut view_rx = session.subscribe();
    let mut chat_rx = session.subscribe_chat();
    let mut notices = session.notices();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    session.start();
    println!("{HELP}");

    let mut last_dashboard = String::new();
    let mut last_connectivity = ConnectivityState::Unknown;
    let mut shown_messages = 0;

    loop {
        tokio::select! {
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let connectivity = view_rx.borrow_and_update().connectivity;
                if connectivity != last_connectivity {
                    if connectivity == ConnectivityState::Degraded {
                        warn!("⚠️ Backend unreachable, showing last known state");
                    }
                    last_connectivity = connectivity;
                }
                let dashboard = render::dashboard(&session.render());
                if dashboard != last_dashboard {
                    println!("{dashboard}");
                    last_dashboard = dashboard;
                }
            }
            changed = chat_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = chat_rx.borrow_and_update();
                let transcript = session.transcript();
                for message in transcript.iter().skip(shown_messages) {
                    println!("{}", render::chat_line(message));
                }
                shown_messages = transcript.len();
            }
            notice = notices.recv() => {
                match notice {
                    Ok(notice) => println!("⚠️ {notice}"),
                    Err(RecvError::Lagged(missed)) => warn!("Missed {} notices", missed),
                    Err(RecvError::Closed) => break,
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => drop(handle_input(session, input)),
                    Err(message) => println!("{message}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    session.stop();
    info!("👋 NOVA client stopped");
    Ok(())
}

/// Act on one input line without waiting on the backend. Requests whose
/// result is printed run in the background; their task is returned.
fn handle_input(session: &Arc<ClientSession>, input: Input) -> Option<JoinHandle<()>> {
    match input {
        Input::Light(command) => {
            // Result arrives as a notice on failure
            drop(session.dispatch_light(command));
            None
        }
        Input::Remote(command) => {
            drop(session.press_remote(command));
            None
        }
        Input::Chat(text) => {
            if let Err(rejected) = session.send_chat(&text) {
                println!("Not sent: {rejected}");
            }
            None
        }
        Input::Say(text) => {
            let session = session.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = session.speak(&text).await {
                    println!("⚠️ Speak failed: {e}");
                }
            }))
        }
        Input::Status => {
            let session = session.clone();
            Some(tokio::spawn(async move {
                session.refresh().await;
                println!("{}", render::dashboard(&session.render()));
            }))
        }
        Input::Help => {
            println!("{HELP}");
            None
        }
        Input::Quit | Input::Empty => None,
    }
}
