//! Edge Functions Server - webhook receiver and query endpoint.
//!
//! This binary:
//! 1. Loads configuration from the environment
//! 2. Connects the configured backend store
//! 3. Serves the webhook, query and health endpoints until SIGINT/SIGTERM

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use edgefn::{router, AppState, Backend, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        backend = ?config.backend,
        backend_url_set = !config.backend_url.is_empty(),
        service_role_key_set = !config.service_role_key.is_empty(),
        anon_key_set = !config.anon_key.is_empty(),
        webhook_secret_set = !config.webhook_secret.is_empty(),
        require_signature = config.require_signature,
        audit_durability = %config.audit_durability,
        audit_table = %config.audit_table,
        "config_loaded"
    );

    if config.require_signature && config.webhook_secret.is_empty() {
        warn!("webhook_secret_missing_all_webhooks_will_be_rejected");
    }

    let backend = Backend::from_config(&config).context("Failed to create backend store")?;
    info!("backend_created");

    let port = config.port;
    let app = router(AppState::new(config, backend));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("server_shutting_down");
}
