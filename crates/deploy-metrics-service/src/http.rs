//! HTTP surface.
//!
//! One intake route plus a liveness probe. The handler's only jobs are to
//! translate the transport request into the core's [`WebhookRequest`] and to
//! map the pipeline's tri-state outcome onto status codes:
//!
//! | Outcome | Status |
//! |---------|--------|
//! | Success (metric emitted or nothing to report) | `204 No Content` |
//! | Validation failure | `400 Bad Request` |
//! | Internal failure | `500 Internal Server Error` |
//!
//! Response bodies stay empty; the upstream sender discards them and error
//! detail belongs in the logs, not on the wire.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use deploy_metrics_core::{ErrorCategory, WebhookHeaders, WebhookPipeline, WebhookRequest};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<WebhookPipeline>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // Header values that are not valid UTF-8 cannot name anything this
    // pipeline consumes; they are dropped rather than rejected wholesale.
    let header_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let webhook_headers = match WebhookHeaders::from_header_map(&header_map) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Rejecting request with missing required headers");
            return StatusCode::BAD_REQUEST;
        }
    };

    let request = WebhookRequest::new(webhook_headers, body);
    match state.pipeline.process(&request).await {
        Ok(Some(tag)) => {
            info!(version = %tag, "Webhook processed; deployment metric emitted");
            StatusCode::NO_CONTENT
        }
        Ok(None) => {
            info!("Webhook processed; nothing to report");
            StatusCode::NO_CONTENT
        }
        Err(e) => match e.error_category() {
            ErrorCategory::Validation => {
                warn!(error = %e, "Rejecting webhook");
                StatusCode::BAD_REQUEST
            }
            ErrorCategory::Internal => {
                error!(error = %e, "Webhook processing failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
