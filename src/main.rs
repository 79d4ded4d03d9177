use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod routing;
mod server;

use config::{reload, AppState, MockConfig, Snapshot};
use error::MockError;

/// Serve static JSON files as HTTP mock endpoints described by a config file
#[derive(Debug, Parser)]
#[command(name = "mockserver", version, about)]
struct Cli {
    /// Path of the JSON route table
    #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Do not reload when the config file changes
    #[arg(long)]
    no_watch: bool,

    /// Number of Tokio worker threads for the config watcher and signal
    /// handling (defaults to CPU cores). Connections are always served on
    /// the main thread.
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = MockConfig::load_from(&cli.config)?;
    logger::init(&cfg.logging)?;
    let snapshot = Snapshot::build(cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cli.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cli, snapshot))
}

async fn async_main(cli: Cli, snapshot: Snapshot) -> Result<(), Box<dyn std::error::Error>> {
    let addr = snapshot.config.socket_addr()?;
    let listener = server::create_reusable_listener(addr)
        .map_err(|source| MockError::Bind { addr, source })?;
    let addr = listener.local_addr()?;

    logger::log_server_start(&addr, &snapshot.config, &snapshot.routes);

    let state = Arc::new(AppState::new(snapshot, &cli.config));
    let shutdown = Arc::new(Notify::new());

    server::signal::start_signal_handler(Arc::clone(&state), Arc::clone(&shutdown))?;

    // `watch.enabled` is checked on every poll, so a reload can switch it
    if !cli.no_watch {
        logger::log_info(&format!("[RELOAD] Watching {} for changes", cli.config));
        tokio::spawn(reload::watch_config(Arc::clone(&state)));
    }

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            shutdown,
        ))
        .await?;

    Ok(())
}
