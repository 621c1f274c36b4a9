//! mqtt-tracker server entry point.
//!
//! Starts the embedded MQTT broker and the Axum HTTP server with the
//! websocket observer endpoint.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mqtt_tracker::api;
use mqtt_tracker::app_state::AppState;
use mqtt_tracker::broker::Broker;
use mqtt_tracker::config::{LogFormat, TrackerConfig};
use mqtt_tracker::domain::EventBus;
use mqtt_tracker::service::EventHub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = TrackerConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    init_tracing(config.log_format);
    tracing::info!(
        http = %config.listen_addr,
        mqtt = %config.mqtt_listen_addr,
        "starting mqtt-tracker"
    );

    // Broker first, so the hub listens before any client can connect
    let broker = Broker::bind(config.broker_config())
        .await
        .context("failed to bind MQTT listener")?;
    let broker_handle = broker.handle();

    // Build service layer
    let hub = Arc::new(EventHub::new(
        EventBus::new(config.event_bus_capacity),
        broker_handle.clone(),
    ));
    let listener_task = hub.spawn_broker_listener();
    let broker_task = broker.spawn();

    // Build router
    let app = api::app(
        AppState::new(Arc::clone(&hub)),
        &config.static_dir,
        config.request_timeout(),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    tracing::info!("http server stopped, shutting down broker");
    broker_handle.shutdown();
    match broker_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "broker stopped with an error"),
        Err(e) => tracing::error!(error = %e, "broker task failed"),
    }
    listener_task.abort();

    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
