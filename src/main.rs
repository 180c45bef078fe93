//! Service orchestrator (v1)
//!
//! Runs a service built entirely from a TOML file: technical HTTP listeners
//! with probe and metrics endpoints, gRPC listeners, and an optional Postgres
//! pool.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      SERVICE                         │
//!                 │                                                      │
//!   config.toml ──┼─▶ options ─▶ registry ─┬─▶ listeners (http, grpc)    │
//!                 │                        ├─▶ data store (sqlx)         │
//!                 │                        └─▶ dependent components      │
//!                 │                                                      │
//!   SIGTERM ──────┼─▶ signal trap ─▶ teardown: components ─▶ grpc ─▶     │
//!                 │                            http ─▶ data store ─▶ sink │
//!                 │                                                      │
//!   probes ◀──────┼── /health/live  /health/ready  /health  /metrics     │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use service_orchestrator::config::{load_config, OrchestratorConfig};
use service_orchestrator::observability::{logging, metrics};
use service_orchestrator::{options_from_config, Service};

#[derive(Parser)]
#[command(name = "service-orchestrator", version)]
#[command(about = "Run a service lifecycle orchestrator from a TOML file", long_about = None)]
struct Cli {
    /// Path to the configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => OrchestratorConfig::default(),
    };

    logging::init_logging(&config.observability);
    if config.observability.metrics_enabled {
        metrics::init_metrics();
    }

    tracing::info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        listeners = config.listeners.len(),
        database = config.database.is_some(),
        "Configuration loaded"
    );

    let service = match Service::new(
        CancellationToken::new(),
        config.service.name.clone(),
        options_from_config(&config),
    ) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build service");
            return ExitCode::FAILURE;
        }
    };

    let started = service.start().await;
    service.stop().await;

    match started {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Service exited with error");
            ExitCode::FAILURE
        }
    }
}
