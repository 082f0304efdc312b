//! User metadata service (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http (axum + middleware) ──▶ users::UserService
//!                                                  │
//!                                                  ▼
//!                                   resilience::execute_with_retry
//!                                                  │  (per attempt)
//!                                                  ▼
//!                                   store::GuardedStore::write
//!                                     ├─ CircuitBreaker (admit / signal)
//!                                     ├─ idempotency check
//!                                     └─ FailureInjector
//!
//!     Cross-cutting: config (TOML + env), observability (tracing, Prometheus),
//!                    lifecycle (startup, signals, graceful shutdown)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

use user_metadata_service::config::loader;
use user_metadata_service::lifecycle::signals::wait_for_signal;
use user_metadata_service::observability::{logging, metrics};
use user_metadata_service::{HttpServer, Shutdown};

const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "User metadata service with a circuit-breaker protected store", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "USER_SERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file and BIND_ADDRESS
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = loader::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("user-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        log_format = ?config.observability.log_format,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();

    let metrics_handle = if config.observability.metrics_enabled {
        let handle = metrics::install_recorder()?;
        let upkeep = handle.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => upkeep.run_upkeep(),
                    _ = stop.recv() => break,
                }
            }
        });
        Some(handle)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let mut server = HttpServer::new(config);
    if let Some(handle) = metrics_handle {
        server = server.with_metrics(handle);
    }

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
