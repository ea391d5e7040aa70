//! AI Collaboration Canvas HTTP server
//!
//! Main entry point for the canvas API.

use std::{sync::Arc, time::Duration};

use infrastructure::{AppConfig, SecurityValidator, TelemetryConfig, init_telemetry};
use presentation_http::{
    AppState, ShutdownOutcome, create_router, serve_with_drain_deadline, set_expose_internal_errors,
    spawn_cleanup_task,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = AppConfig::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            (config, Some(e))
        },
    };

    let production = config.environment.is_production();
    init_telemetry(&TelemetryConfig::new(
        config.server.log_filter.clone(),
        production,
    ))?;

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config file, using defaults");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "AI Collaboration Canvas starting"
    );

    let warnings = SecurityValidator::validate(&config);
    SecurityValidator::log_warnings(&warnings);
    if SecurityValidator::should_block_startup(&config, &warnings) {
        error!("Critical security warnings in production, refusing to start");
        anyhow::bail!("startup blocked by security validation");
    }

    set_expose_internal_errors(!production);

    let addr = config.server.bind_address();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let sweep_interval = Duration::from_secs(config.limits.sweep_interval_secs);
    let retention = Duration::from_secs(config.limits.retention_secs);

    let state = AppState::from_config(config)?;
    let sweeper = spawn_cleanup_task(Arc::clone(&state.rate_limits), sweep_interval, retention);

    let app = create_router(state);
    let listener = TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    let outcome =
        serve_with_drain_deadline(listener, app, shutdown_signal(), shutdown_timeout).await?;

    sweeper.abort();
    match outcome {
        ShutdownOutcome::Drained => info!("Server shutdown complete"),
        ShutdownOutcome::DeadlineExceeded => warn!("Server shutdown forced after drain deadline"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
