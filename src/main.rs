//! Task List Relay
//!
//! Message-driven adapter between a task-list request queue and the ERP
//! maintenance-task-list read API. Deliveries arrive as NDJSON on stdin,
//! one read call is issued per requested sub-resource, and results are
//! forwarded as NDJSON on stdout.

mod caller;
mod config;
mod consumer;
mod error;
mod payload;
mod transport;

use caller::ErpCaller;
use config::Config;
use consumer::Consumer;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    // Transport wiring: inbound channel fed from stdin, outbound to stdout,
    // dispositions logged (a broker client would confirm/requeue here).
    let (payload_tx, mut source, disposition_rx) =
        transport::channel_source(config.queue.capacity);
    let (sink, result_rx) = transport::channel_sink();
    let feeder = transport::spawn_stdin_feeder(payload_tx);
    let writer = transport::spawn_stdout_writer(result_rx);
    let disposition_logger = transport::spawn_disposition_logger(disposition_rx);

    // Single shared HTTP client for all ERP calls (connection pooling)
    let caller = ErpCaller::new(
        reqwest::Client::new(),
        config.erp.base_url.clone(),
        config.erp.api_key.clone(),
        Arc::new(sink),
    );
    let consumer = Consumer::new(caller);

    info!(erp_base_url = %config.erp.base_url, "Consumption loop starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        _ = consumer.run(&mut source) => {
            info!("Inbound channel exhausted");
        }
        _ = shutdown_signal() => {
            info!("Shutdown requested, stopping consumption loop");
        }
    }

    // Release transport resources
    feeder.abort();
    drop(source);
    disposition_logger.abort();
    writer.abort();

    info!("Relay shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
