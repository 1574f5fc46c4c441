//! Compliance Copilot entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration** from the environment ([`config::AppConfig`]).
//! 2. **Wire observability** with `tracing-subscriber` and, when an endpoint
//!    is configured, an OpenTelemetry OTLP exporter ([`telemetry`]). All
//!    `tracing` spans and events from every crate flow through it.
//! 3. **Construct infrastructure**: the `CompleteDevClient` upstream adapter,
//!    the JWT identity verifier, and the process-wide rate limiter, injected
//!    into the listener's `AppState`.
//! 4. **Serve** the axum router until Ctrl-C, with the rate-limit sweep
//!    running alongside.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use listener::{spawn_sweeper, AppState, JwtVerifier};
use llm::CompleteDevClient;
use pipeline::{AgentClient, RateLimiter};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    let telemetry = telemetry::init(&config.telemetry)?;

    let outcome = serve(config).await;
    if let Err(e) = &outcome {
        tracing::error!(error = %format!("{e:#}"), "server stopped with an error");
    }
    telemetry.shutdown();
    outcome
}

async fn serve(config: AppConfig) -> Result<()> {
    let client = CompleteDevClient::new(config.upstream).context("building upstream HTTP client")?;
    if let Err(e) = client.ensure_configured() {
        tracing::warn!(error = %e, "upstream not configured; generation requests will fail until it is");
    }

    let limiter = Arc::new(RateLimiter::new(config.rate_limits));
    let state = AppState::new(
        Arc::new(client),
        Arc::new(JwtVerifier::new(config.jwt_secret.as_bytes())),
        Arc::clone(&limiter),
    );
    state
        .catalog
        .validate_against(&state.registry)
        .context("tool catalog references unknown agents")?;
    tracing::info!(
        agents = state.registry.len(),
        tools = state.catalog.iter().count(),
        "catalog loaded"
    );

    let sweeper = config
        .sweep_interval
        .map(|interval| spawn_sweeper(Arc::clone(&limiter), interval));

    let app = listener::app(state);
    let tcp = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Compliance Copilot listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
