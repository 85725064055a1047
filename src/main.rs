#![forbid(unsafe_code)]

//! `ticket-inbox`: headless agent inbox.
//!
//! Loads configuration, bootstraps the agent's inbox against the ticket REST
//! API, then applies real-time events read as NDJSON from stdin until the
//! feed ends or the process is signalled.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use ticket_inbox::api::http::HttpTicketApi;
use ticket_inbox::config::GlobalConfig;
use ticket_inbox::feed::codec::EventCodec;
use ticket_inbox::feed::reader::run_feed_reader;
use ticket_inbox::inbox::reconcile::spawn_event_consumer;
use ticket_inbox::inbox::InboxEngine;
use ticket_inbox::session::SessionStore;
use ticket_inbox::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ticket-inbox", about = "Per-agent support ticket inbox", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Ticket to open on startup instead of the first queued one.
    #[arg(long)]
    ticket: Option<String>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("ticket-inbox bootstrap");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?;
    let result = runtime.block_on(run(args));
    // stdin reads park a blocking thread that never returns on its own.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    info!(
        agent_id = config.agent_id,
        api = config.api_base_url.as_str(),
        authenticated = config.api_token.is_some(),
        "configuration loaded"
    );

    // ── Engine ──────────────────────────────────────────
    let api = Arc::new(HttpTicketApi::from_config(&config)?);
    let session = SessionStore::new();
    let engine = InboxEngine::from_config(api, session.clone(), &config);

    match engine.bootstrap(args.ticket.as_deref()).await? {
        Some(ticket) => info!(ticket_id = %ticket.ticket_id, "ticket opened"),
        None => info!("inbox is empty"),
    }

    // ── Background tasks ────────────────────────────────
    let cancel = CancellationToken::new();
    let (event_tx, event_rx) = mpsc::channel(config.sync.event_channel_capacity);

    let consumer = spawn_event_consumer(Arc::clone(&engine), event_rx, cancel.clone());
    let counter = spawn_counter_logger(session, cancel.clone());
    let mut feed = tokio::spawn(run_feed_reader(
        tokio::io::stdin(),
        EventCodec::with_max_length(config.sync.max_event_line_bytes),
        event_tx,
        cancel.clone(),
    ));

    // ── Wait for shutdown ───────────────────────────────
    tokio::select! {
        () = shutdown_signal() => info!("shutdown signal received"),
        result = &mut feed => match result {
            Ok(Ok(stats)) => info!(forwarded = stats.forwarded, rejected = stats.rejected, "event feed finished"),
            Ok(Err(err)) => error!(%err, "event feed failed"),
            Err(err) => error!(%err, "event feed task panicked"),
        },
    }

    cancel.cancel();
    engine.scheduler().cancel();
    for (name, handle) in [("event consumer", consumer), ("counter logger", counter)] {
        if let Err(err) = handle.await {
            warn!(%err, task = name, "background task ended abnormally");
        }
    }
    if !feed.is_finished() {
        feed.abort();
    }

    info!(unread = engine.unread_count(), "ticket-inbox stopped");
    Ok(())
}

/// Log every change of the unread counter.
fn spawn_counter_logger(
    session: SessionStore,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let unread = rx.borrow_and_update().new_ticket_count;
                    info!(unread, "unread counter changed");
                }
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
