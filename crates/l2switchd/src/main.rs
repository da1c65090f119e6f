//! L2 learning switch controller daemon
//!
//! Reads switch messages as JSON lines on stdin and writes the resulting
//! switch commands as JSON lines on stdout. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use sdn_l2switchd::config::DEFAULT_CONFIG_PATH;
use sdn_l2switchd::{
    jsonl, logging, ControllerConfig, Dispatcher, ForwardingEngine, LogFormat, MpscChannel,
    RecordingChannel, SwitchChannel,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Depth of the queue between the inbound reader and the dispatcher
const EVENT_QUEUE_DEPTH: usize = 1024;

#[derive(Parser, Debug)]
#[command(name = "l2switchd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level or filter directive, overrides the config file
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Log output format, overrides the config file
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Process input but only record commands instead of writing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match ControllerConfig::load(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("l2switchd: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config_found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("l2switchd: {e}");
        return ExitCode::FAILURE;
    }

    info!(config = %args.config.display(), dry_run = args.dry_run, "l2switchd: Starting");
    if !config_found {
        info!(path = %args.config.display(), "Config file not found, using defaults");
    }

    match run(config, args.dry_run).await {
        Ok(()) => {
            info!("l2switchd: Exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("l2switchd: Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ControllerConfig, dry_run: bool) -> anyhow::Result<()> {
    let engine = Arc::new(ForwardingEngine::from_config(&config));
    let cancel = CancellationToken::new();

    tokio::spawn(shutdown_on_signal(cancel.clone()));

    if let Some(aging) = config.aging_time() {
        tokio::spawn(sweep_stale_entries(Arc::clone(&engine), aging, cancel.clone()));
    }

    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let reader = tokio::spawn(jsonl::read_events(BufReader::new(tokio::io::stdin()), event_tx));

    if dry_run {
        let channel = Arc::new(RecordingChannel::new());
        Dispatcher::new(Arc::clone(&engine), channel.clone())
            .run(event_rx, cancel.clone())
            .await;

        for switch_id in engine.registry().switches() {
            info!(
                switch = %switch_id,
                commands = channel.commands_for(switch_id).len(),
                learned = engine.registry().table_len(switch_id).unwrap_or(0),
                "Dry run summary"
            );
        }
    } else {
        let (channel, command_rx) = MpscChannel::new();
        let channel = Arc::new(channel);
        let writer = tokio::spawn(jsonl::write_commands(command_rx, tokio::io::stdout()));

        Dispatcher::new(Arc::clone(&engine), channel.clone() as Arc<dyn SwitchChannel>)
            .run(event_rx, cancel.clone())
            .await;

        if channel.dropped() > 0 {
            warn!(dropped = channel.dropped(), "Commands were dropped");
        }
        // Last sender gone: the writer drains what is queued and returns.
        drop(channel);
        let written = writer.await.context("command writer panicked")??;
        debug!(written, "Command writer finished");
    }

    // After cancellation stdin may still be blocked on a read. Otherwise the
    // dispatcher stopped because the reader finished, and its result counts.
    let reader_result = if cancel.is_cancelled() {
        reader.abort();
        Ok(())
    } else {
        match reader.await.context("event reader panicked")? {
            Ok(forwarded) => {
                debug!(forwarded, "Event reader finished");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("failed to read switch messages")),
        }
    };

    let stats = engine.stats();
    info!(
        switches = stats.switches_connected,
        frames = stats.frames_processed,
        flows = stats.flows_installed,
        floods = stats.floods,
        moves = stats.station_moves,
        "Final statistics"
    );

    reader_result
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("l2switchd: Received shutdown signal"),
        Err(e) => {
            error!(error = %e, "l2switchd: Failed to listen for shutdown signal");
            return;
        }
    }
    cancel.cancel();
}

/// Periodically removes learned entries older than `aging`.
async fn sweep_stale_entries(engine: Arc<ForwardingEngine>, aging: Duration, cancel: CancellationToken) {
    let period = (aging / 2).max(Duration::from_secs(1));
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let removed = engine.registry().expire_stale(std::time::Instant::now());
                if removed > 0 {
                    debug!(removed, "Expired stale forwarding entries");
                }
            }
        }
    }
}
