//! # Deploy-Metrics Service
//!
//! Binary entry point for the deployment-metrics webhook service.
//!
//! This executable:
//! - Loads configuration from file and environment
//! - Initializes observability (logging)
//! - Resolves the webhook signing secret and the Datadog API key, once
//! - Builds the webhook pipeline with the Datadog-backed metrics sink
//! - Starts the HTTP server

mod config;
mod datadog;
mod http;

use crate::config::ServiceConfig;
use crate::datadog::DatadogMetricsSink;
use crate::http::{router, AppState};
use deploy_metrics_core::WebhookPipeline;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "deploy_metrics_service=info,deploy_metrics_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Deploy-Metrics Service");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Absent files and an unconfigured environment produce the built-in
    // defaults; validation below decides whether those are complete enough
    // to start. Malformed operator configuration is a hard error.
    // -------------------------------------------------------------------------
    let service_config = match ServiceConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(
            error = %e,
            "Service configuration is invalid; aborting. \
             Fix the configuration and restart."
        );
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Resolve secrets
    //
    // Both secrets are resolved exactly once and held in memory for the
    // process lifetime.
    // -------------------------------------------------------------------------
    let webhook_secret = match service_config.resolve_webhook_secret() {
        Ok(secret) => secret,
        Err(e) => {
            error!(error = %e, "Could not resolve the webhook signing secret; aborting");
            std::process::exit(3);
        }
    };

    let datadog_api_key = match service_config.resolve_datadog_api_key() {
        Ok(secret) => secret,
        Err(e) => {
            error!(error = %e, "Could not resolve the Datadog API key; aborting");
            std::process::exit(3);
        }
    };

    // -------------------------------------------------------------------------
    // Build the pipeline and serve
    // -------------------------------------------------------------------------
    let sink = Arc::new(DatadogMetricsSink::new(
        &service_config.datadog,
        datadog_api_key,
    ));
    info!(sink = ?sink, "Configured Datadog metrics sink");

    let pipeline = Arc::new(WebhookPipeline::new(webhook_secret, sink));
    let app = router(AppState { pipeline });

    let bind_address = service_config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Listening for webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Deploy-Metrics Service stopped");
    Ok(())
}

/// Resolve when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install shutdown signal handler");
    }
}
