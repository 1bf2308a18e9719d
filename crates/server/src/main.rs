mod bootstrap;
mod health;
mod schedule;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use seafoodtruck_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;

use crate::schedule::Broadcaster;

fn init_logging(config: &AppConfig) {
    use seafoodtruck_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on config, so load it first.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let broadcast = Broadcaster::from_config(&app.config, app.responder.clone(), app.poster.clone())
        .map(|broadcaster| {
            tracing::info!(
                event_name = "system.broadcast.enabled",
                correlation_id = "bootstrap",
                channel = %broadcaster.channel(),
                "daily broadcast scheduled"
            );
            broadcaster.spawn()
        });

    let router = webhook::router(app.webhook_state()).merge(health::router(app.health_state()));
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        broadcast = broadcast.is_some(),
        "seafoodtruck-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "seafoodtruck-server stopping"
    );

    if let Some(handle) = broadcast {
        handle.abort();
    }
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not finish within the grace period"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
