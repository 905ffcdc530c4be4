//! Metric data points and the sink boundary.
//!
//! The core never talks to the monitoring backend directly. It builds a
//! [`MetricDataPoint`] from an extracted [`VersionTag`] and hands it to an
//! injected [`MetricsSink`]; the service binary supplies the Datadog-backed
//! implementation and tests supply a recording fake.

use crate::version::VersionTag;
use crate::Timestamp;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Metric name counting observed deployment versions.
pub const VERSION_COUNT_METRIC: &str = "deployment.metrics.versions";

/// Tag attached to release-candidate versions.
pub const RC_TAG: &str = "RC";

// ============================================================================
// Data Point
// ============================================================================

/// Resource label attached to a metric series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricResource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// A single write-once metric observation.
///
/// Built from a [`VersionTag`], submitted once, then discarded. Nothing is
/// batched or retained across invocations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDataPoint {
    /// Metric series name.
    pub metric: String,
    /// Observation time, second resolution.
    pub timestamp: Timestamp,
    /// Counter increment; always `1.0` for version counts.
    pub value: f64,
    /// Fixed resource labels for the series.
    pub resources: Vec<MetricResource>,
    /// Derived tag set.
    pub tags: Vec<String>,
}

impl MetricDataPoint {
    /// Build the deployment-version count point for an extracted tag.
    ///
    /// The tag set carries the raw tag string, the `vMAJOR.MINOR` label in
    /// bare and `version:`-prefixed forms, and — only for release
    /// candidates — the `RC` marker.
    pub fn version_count(tag: &VersionTag, timestamp: Timestamp) -> Self {
        let mut tags = vec![
            tag.raw.clone(),
            tag.short_version(),
            format!("version:{}", tag.short_version()),
        ];
        if tag.is_release_candidate() {
            tags.push(RC_TAG.to_string());
        }

        Self {
            metric: VERSION_COUNT_METRIC.to_string(),
            timestamp,
            value: 1.0,
            resources: vec![MetricResource {
                name: "enterprise".to_string(),
                resource_type: "version".to_string(),
            }],
            tags,
        }
    }
}

// ============================================================================
// Sink Boundary
// ============================================================================

/// Errors surfaced by a metrics sink.
///
/// Submission failures are infrastructure faults. The core surfaces them to
/// the caller and never retries; retry policy belongs to the hosting
/// platform.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("metrics backend rejected the submission: status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("could not reach the metrics backend: {message}")]
    Transport { message: String },
}

/// Outbound boundary for metric submission.
///
/// Implementations must be safe to share behind `Arc` across concurrent
/// invocations; the pipeline holds `Arc<dyn MetricsSink>`.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Submit a single data point.
    async fn submit(&self, point: MetricDataPoint) -> Result<(), SubmissionError>;
}

/// Sink that drops every point.
///
/// Lets the pipeline run without a metrics backend, e.g. in local
/// development.
#[derive(Debug, Clone, Default)]
pub struct NoOpMetricsSink;

#[async_trait]
impl MetricsSink for NoOpMetricsSink {
    async fn submit(&self, point: MetricDataPoint) -> Result<(), SubmissionError> {
        debug!(metric = %point.metric, tags = ?point.tags, "Dropping metric point (no-op sink)");
        Ok(())
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
