mod bootstrap;
mod health;
mod routes;
mod sweeper;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use eatba_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use crate::health::HealthState;
use crate::routes::EventsState;

fn init_logging(config: &AppConfig) {
    use eatba_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.trim().to_ascii_lowercase()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    let sweeper = sweeper::spawn(
        Arc::clone(&app.sessions),
        app.config.session.sweep_interval(),
        Arc::clone(&app.audit_sink),
    );

    let router = routes::router(
        HealthState { catalog: Arc::clone(&app.catalog), sessions: app.sessions.clone() },
        EventsState {
            dispatcher: Arc::clone(&app.dispatcher),
            audit_sink: Arc::clone(&app.audit_sink),
        },
    );

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "eatba-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(Arc::clone(&shutdown)))
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = grace_elapsed(&shutdown, grace) => {
            tracing::warn!(
                event_name = "system.server.grace_elapsed",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight requests outlived the shutdown grace period"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "eatba-server stopped"
    );
    sweeper.abort();

    Ok(())
}

async fn wait_for_shutdown(shutdown: Arc<Notify>) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "eatba-server draining in-flight requests"
    );
    shutdown.notify_one();
}

/// Resolves `grace` after the shutdown signal fires.
async fn grace_elapsed(shutdown: &Notify, grace: Duration) {
    shutdown.notified().await;
    tokio::time::sleep(grace).await;
}
