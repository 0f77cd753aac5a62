//! agenda-notify - Real-time booking notifications in the terminal
//!
//! Connects to the booking server's notifications channel and prints each
//! notification as it arrives. Connection loss is retried automatically;
//! once the retry budget is spent, pressing Enter reconnects.
//!
//! # Usage
//!
//! ```bash
//! # Connect to a panel, token from the environment
//! AGENDA_TOKEN=abc123 agenda-notify --url https://salon.example.com/
//!
//! # Custom config file and a tighter retry budget
//! agenda-notify --config ./agenda.toml --max-attempts 3 --interval-ms 2000
//!
//! # Enable debug logging
//! RUST_LOG=agenda_client=debug agenda-notify
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: stop the connection and exit

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use agenda_client::console::{console_collaborators, ConsoleOutput, ConsoleRetryPrompt};
use agenda_client::{
    authenticated_transport, ClientConfig, NotificationClient, DEFAULT_SHUTDOWN_TIMEOUT,
};

const DEFAULT_LOG_FILTER: &str = "agenda_notify=info,agenda_client=info";

/// Real-time booking notifications client
#[derive(Parser, Debug)]
#[command(name = "agenda-notify", version, about)]
struct Args {
    /// Config file (defaults to ~/.config/agenda-notify/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL of the booking panel; the channel endpoint is derived from it
    #[arg(long, env = "AGENDA_URL")]
    url: Option<String>,

    /// Identity token presented to the server
    #[arg(long, env = "AGENDA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Consecutive failed attempts before asking for a manual retry
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between reconnect attempts, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Keep-alive ping interval in seconds (0 disables)
    #[arg(long)]
    keepalive_secs: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.url {
            config.page_url = url.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.reconnect.max_attempts = max_attempts;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.reconnect.interval = Duration::from_millis(interval_ms);
        }
        if let Some(keepalive_secs) = self.keepalive_secs {
            config.keepalive_secs = Some(keepalive_secs);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let result = runtime.block_on(run(args));

    // The stdin reader sits in a blocking read; don't wait for it
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut config =
        ClientConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // Anonymous channels are rejected by the server, so don't even try
    let transport = authenticated_transport(&config, args.token.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %transport.endpoint(),
        "agenda-notify starting"
    );

    let cancel_token = CancellationToken::new();
    let (collaborators, prompt) = console_collaborators(ConsoleOutput::stdout());
    let client = NotificationClient::launch(
        &config,
        Arc::new(transport),
        collaborators,
        cancel_token.clone(),
    )?;
    let _retry_listener = spawn_retry_listener(prompt, cancel_token.clone());

    if let Err(e) = wait_for_shutdown_signal().await {
        error!(error = %e, "Error waiting for shutdown signal");
    }
    info!("Shutdown signal received");

    client.shutdown(DEFAULT_SHUTDOWN_TIMEOUT).await?;
    info!("agenda-notify stopped");
    Ok(())
}

/// Activates the retry prompt whenever a line is read from stdin.
fn spawn_retry_listener(
    prompt: Arc<ConsoleRetryPrompt>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(_)) => {
                        if let Some(trigger) = prompt.take_pending() {
                            trigger.activate();
                        }
                    }
                    // stdin closed; manual retry is no longer possible
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                },
            }
        }
    })
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
