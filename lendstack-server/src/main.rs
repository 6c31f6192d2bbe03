//! Lendstack loan-administration backend.
//!
//! Serves the entity and operational endpoints over HTTP, keeps every
//! record in the local key-value store and mirrors changes to a remote
//! PostgREST store when one is configured.
//!
//! Usage:
//!   lendstack-server --port 3000 --remote-url https://xyz.supabase.co

use anyhow::{Context, Result};
use clap::Parser;
use lendstack_model::Repositories;
use lendstack_server::{AppState, build_router};
use lendstack_storage::{KvStore, StorageConfig, StorageMode};
use lendstack_sync::{
    MemoryMirror, PeriodicSync, RemoteMirror, RestMirror, RestMirrorConfig, SyncConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "lendstack-server")]
#[command(about = "Loan administration backend with remote mirror sync")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, env = "LENDSTACK_PORT", default_value = "3000")]
    port: u16,

    /// Override the data directory
    #[arg(long, env = "LENDSTACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Force a storage mode: persistent, ephemeral or memory
    #[arg(long, env = "LENDSTACK_STORAGE_MODE")]
    storage_mode: Option<StorageMode>,

    /// Remote mirror project URL; mirrors in process memory when unset
    #[arg(long, env = "LENDSTACK_REMOTE_URL")]
    remote_url: Option<String>,

    /// Remote mirror API key
    #[arg(long, env = "LENDSTACK_REMOTE_KEY", hide_env_values = true, default_value = "")]
    remote_key: String,

    /// Remote mirror schema, when not the default one
    #[arg(long, env = "LENDSTACK_REMOTE_SCHEMA")]
    remote_schema: Option<String>,

    /// Seconds between periodic full syncs; 0 or unset disables them
    #[arg(long, env = "LENDSTACK_SYNC_INTERVAL_SECS")]
    sync_interval_secs: Option<u64>,

    /// Number of background sync workers
    #[arg(long, env = "LENDSTACK_SYNC_WORKERS", default_value = "4")]
    sync_workers: usize,

    /// Start empty instead of seeding sample records
    #[arg(long)]
    no_seed: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("Lendstack server starting...");

    let store = Arc::new(KvStore::detect(&StorageConfig {
        mode: args.storage_mode,
        data_dir: args.data_dir.clone(),
    }));
    let repos = if args.no_seed {
        Repositories::open_unseeded(store)
    } else {
        Repositories::open(store)
    }
    .context("Failed to load repositories")?;

    let mirror: Arc<dyn RemoteMirror> = match &args.remote_url {
        Some(url) => {
            let config = RestMirrorConfig {
                base_url: url.clone(),
                api_key: args.remote_key.clone(),
                schema: args.remote_schema.clone(),
                ..RestMirrorConfig::default()
            };
            Arc::new(RestMirror::new(config).context("Failed to create remote mirror client")?)
        }
        None => {
            warn!("No remote mirror configured, mirroring into process memory");
            Arc::new(MemoryMirror::new())
        }
    };
    info!("Remote mirror: {}", mirror.provider_name());

    let config = SyncConfig {
        workers: args.sync_workers,
        periodic_interval_secs: args.sync_interval_secs,
        ..SyncConfig::default()
    };
    let periodic_interval = config.periodic_interval();

    let state = AppState::new(Arc::new(repos), mirror, config);
    let periodic = periodic_interval
        .map(|interval| PeriodicSync::spawn(state.sync.clone(), state.reporter.clone(), interval));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutting down...");
    if let Some(periodic) = periodic {
        periodic.stop().await;
    }
    state
        .repos
        .flush_all()
        .context("Failed to flush repositories")?;
    state.dispatcher.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

fn init_logging(verbose: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .compact()
            .init();
    } else {
        let log_level = if verbose { Level::DEBUG } else { Level::INFO };
        FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_target(false)
            .compact()
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
