//! # Deploy-Metrics Core
//!
//! Core business logic for the deployment-metrics webhook service.
//!
//! This crate contains the domain logic for receiving GitHub webhooks,
//! validating signatures, decoding events, extracting semantic version tags
//! from tag-creation events, and building the deployment-version metric that
//! is handed to an injected metrics sink.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//! - Infrastructure implementations (HTTP server, Datadog client) are
//!   injected at runtime by the service binary
//! - Each invocation is stateless; nothing is shared between requests
//!
//! ## Usage
//!
//! ```rust
//! use deploy_metrics_core::version::VersionTag;
//!
//! let tag = VersionTag::extract("v1.40.14").expect("release tag");
//! assert_eq!(tag.major, 1);
//! assert!(!tag.is_release_candidate());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod classifier;
pub mod events;
pub mod metrics;
pub mod secrets;
pub mod version;
pub mod webhook;

pub use classifier::{classify, ClassifyError};
pub use events::{decode_event, DecodeError, DecodedEvent};
pub use metrics::{MetricDataPoint, MetricsSink, NoOpMetricsSink, SubmissionError};
pub use secrets::SecretValue;
pub use version::VersionTag;
pub use webhook::{PipelineError, WebhookHeaders, WebhookPipeline, WebhookRequest};

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp used throughout the pipeline.
///
/// Metric points are reported at second resolution; [`Timestamp::unix_seconds`]
/// provides exactly that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ValidationError::InvalidFormat {
                field: "timestamp".to_string(),
                message: "must be RFC3339 datetime".to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Seconds since the Unix epoch, the resolution of metric points
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for structurally invalid input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },
}

/// Fault attribution for a pipeline failure.
///
/// Together with the pipeline's `Result<Option<VersionTag>, PipelineError>`
/// this forms the tri-state outcome the hosting layer maps to HTTP status
/// codes: success (possibly with nothing to report), a client-attributable
/// validation failure, or an internal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something this service does not accept (4xx)
    Validation,
    /// This service or a downstream dependency failed (5xx)
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
