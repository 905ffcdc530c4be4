//! Datadog-backed metrics sink.
//!
//! Implements the core's [`MetricsSink`] boundary against the Datadog v2
//! metric-series intake. One POST per data point; failures surface to the
//! pipeline as [`SubmissionError`] and are never retried here — retry
//! policy belongs to the hosting platform.

use crate::config::DatadogConfig;
use async_trait::async_trait;
use deploy_metrics_core::{MetricDataPoint, MetricsSink, SecretValue, SubmissionError};
use serde::Serialize;
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "DD-API-KEY";

/// Datadog v2 metric intake type for count series.
const METRIC_INTAKE_TYPE_COUNT: i32 = 1;

// ============================================================================
// Wire Format
// ============================================================================

/// Body of a `POST /api/v2/series` request.
#[derive(Debug, Serialize)]
struct SeriesPayload {
    series: Vec<Series>,
}

#[derive(Debug, Serialize)]
struct Series {
    metric: String,
    #[serde(rename = "type")]
    intake_type: i32,
    points: Vec<Point>,
    resources: Vec<Resource>,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Point {
    timestamp: i64,
    value: f64,
}

#[derive(Debug, Serialize)]
struct Resource {
    name: String,
    #[serde(rename = "type")]
    resource_type: String,
}

impl SeriesPayload {
    /// Map a core data point onto the intake body. One series, one point.
    fn from_point(point: &MetricDataPoint) -> Self {
        Self {
            series: vec![Series {
                metric: point.metric.clone(),
                intake_type: METRIC_INTAKE_TYPE_COUNT,
                points: vec![Point {
                    timestamp: point.timestamp.unix_seconds(),
                    value: point.value,
                }],
                resources: point
                    .resources
                    .iter()
                    .map(|r| Resource {
                        name: r.name.clone(),
                        resource_type: r.resource_type.clone(),
                    })
                    .collect(),
                tags: point.tags.clone(),
            }],
        }
    }
}

// ============================================================================
// Sink
// ============================================================================

/// [`MetricsSink`] implementation submitting to the Datadog intake.
pub struct DatadogMetricsSink {
    client: reqwest::Client,
    series_url: String,
    api_key: SecretValue,
}

impl DatadogMetricsSink {
    /// Create a sink for the configured site (or endpoint override) and the
    /// resolved API key.
    pub fn new(config: &DatadogConfig, api_key: SecretValue) -> Self {
        Self {
            client: reqwest::Client::new(),
            series_url: config.series_url(),
            api_key,
        }
    }
}

impl std::fmt::Debug for DatadogMetricsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatadogMetricsSink")
            .field("series_url", &self.series_url)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl MetricsSink for DatadogMetricsSink {
    /// Submit one data point as a single-series intake request.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Transport`] when the intake cannot be
    /// reached and [`SubmissionError::Rejected`] for any non-2xx response.
    #[instrument(skip(self, point), fields(metric = %point.metric))]
    async fn submit(&self, point: MetricDataPoint) -> Result<(), SubmissionError> {
        let response = self
            .client
            .post(&self.series_url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&SeriesPayload::from_point(&point))
            .send()
            .await
            .map_err(|e| SubmissionError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = %status, "Submitted metric series");
        Ok(())
    }
}

#[cfg(test)]
#[path = "datadog_tests.rs"]
mod tests;
