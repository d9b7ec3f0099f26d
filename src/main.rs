//! Request observability service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                   PIPELINE                           │
//!   Client Request   │  ┌──────────┐  ┌──────────┐  ┌─────────┐  ┌────────┐ │
//!   ─────────────────┼─▶│request_id│─▶│ recovery │─▶│ observe │─▶│handler │ │
//!                    │  └──────────┘  └──────────┘  └────┬────┘  └────────┘ │
//!                    │                                   │ finalize once    │
//!                    │                        ┌──────────┴──────────┐       │
//!                    │                        ▼                     ▼       │
//!                    │                 ┌────────────┐       ┌────────────┐  │
//!                    │                 │  metrics   │       │ access_log │  │
//!                    │                 │  registry  │       │  (tracing) │  │
//!                    │                 └────────────┘       └────────────┘  │
//!                    │                                                      │
//!                    │  health: readiness/liveness ◀── availability events  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use request_observability::config::{self, LoggingConfig};
use request_observability::lifecycle::signals;
use request_observability::observability::logging::init_logging;
use request_observability::HttpServer;

#[derive(Debug, Parser)]
#[command(version, about = "HTTP service with request observability")]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&LoggingConfig::default());
            tracing::error!(error = %e, "invalid_config");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server_error");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: config::ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        shutdown_timeout_secs = config.timeouts.shutdown_secs,
        build_time = %config.service.build_time,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let server = HttpServer::new(config)?;
    server.run(listener, signals::termination()).await?;

    Ok(())
}
