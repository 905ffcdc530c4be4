//! # Webhook Processing Module
//!
//! Inbound request model and the processing pipeline: signature
//! verification, event decoding, classification, and metric submission.
//!
//! Control flow for one invocation:
//!
//! ```text
//! raw request -> verify_signature -> decode_event -> classify -> [submit metric]
//! ```
//!
//! Every stage resolves its own failures into [`PipelineError`]; nothing
//! panics past a component boundary, and each invocation is independent.

use crate::classifier::{classify, ClassifyError};
use crate::events::{decode_event, DecodeError};
use crate::metrics::{MetricDataPoint, MetricsSink, SubmissionError};
use crate::secrets::SecretValue;
use crate::version::VersionTag;
use crate::{ErrorCategory, Timestamp, ValidationError};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub mod signature;

pub use signature::{verify_signature, SignatureError, SignatureScheme, VerifiedPayload};

/// Header carrying the event-type identifier.
pub const EVENT_TYPE_HEADER: &str = "x-github-event";
/// Header carrying the HMAC-SHA256 signature.
pub const SIGNATURE_SHA256_HEADER: &str = "x-hub-signature-256";
/// Header carrying the legacy HMAC-SHA1 signature.
pub const SIGNATURE_SHA1_HEADER: &str = "x-hub-signature";
/// Header carrying the delivery identifier, used for log correlation only.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";

// ============================================================================
// Core Types
// ============================================================================

/// Headers this pipeline consumes, extracted case-insensitively.
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    /// Declared event kind (`X-GitHub-Event`). Required.
    pub event_type: String,
    /// HMAC-SHA256 signature (`X-Hub-Signature-256`), preferred when present.
    pub signature_sha256: Option<String>,
    /// Legacy HMAC-SHA1 signature (`X-Hub-Signature`).
    pub signature_sha1: Option<String>,
    /// Raw `Content-Type` value, parameters included. Required.
    pub content_type: String,
    /// Delivery identifier (`X-GitHub-Delivery`), for log correlation.
    pub delivery_id: Option<String>,
}

impl WebhookHeaders {
    /// Extract the pipeline headers from an HTTP header map.
    ///
    /// Lookup is case-insensitive: keys are folded to lowercase before
    /// matching, so `X-GitHub-Event`, `x-github-event`, and any other
    /// casing are equivalent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] when the event-type or
    /// content-type header is missing or empty. Signature headers are
    /// optional here; their absence is judged during verification.
    pub fn from_header_map(headers: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let lowered: HashMap<String, &str> = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.as_str()))
            .collect();

        let require = |name: &str| -> Result<String, ValidationError> {
            lowered
                .get(name)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
                .ok_or_else(|| ValidationError::Required {
                    field: name.to_string(),
                })
        };
        let optional = |name: &str| lowered.get(name).map(|v| v.to_string());

        Ok(Self {
            event_type: require(EVENT_TYPE_HEADER)?,
            signature_sha256: optional(SIGNATURE_SHA256_HEADER),
            signature_sha1: optional(SIGNATURE_SHA1_HEADER),
            content_type: require("content-type")?,
            delivery_id: optional(DELIVERY_ID_HEADER),
        })
    }
}

/// Raw HTTP request data for one webhook invocation. Immutable once built.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub headers: WebhookHeaders,
    pub body: Bytes,
    pub received_at: Timestamp,
}

impl WebhookRequest {
    /// Create new webhook request
    pub fn new(headers: WebhookHeaders, body: Bytes) -> Self {
        Self {
            headers,
            body,
            received_at: Timestamp::now(),
        }
    }

    /// Get event type from headers
    pub fn event_type(&self) -> &str {
        &self.headers.event_type
    }

    /// Delivery ID for log correlation, or `"-"` when the header is absent.
    pub fn delivery_id(&self) -> &str {
        self.headers.delivery_id.as_deref().unwrap_or("-")
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Top-level error for pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("webhook signature could not be verified")]
    SignatureInvalid,

    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("unhandled event type: {event_type}")]
    UnhandledEventType { event_type: String },

    #[error("metric submission failed: {0}")]
    MetricSubmission(#[from] SubmissionError),
}

impl PipelineError {
    /// Fault attribution for status-code mapping.
    ///
    /// Everything the sender got wrong — signature, content type, payload
    /// shape, event type outside the contract — is a validation failure.
    /// Only sink submission faults are internal.
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::SignatureInvalid => ErrorCategory::Validation,
            Self::UnsupportedContentType { .. } => ErrorCategory::Validation,
            Self::MalformedPayload { .. } => ErrorCategory::Validation,
            Self::UnhandledEventType { .. } => ErrorCategory::Validation,
            Self::MetricSubmission(_) => ErrorCategory::Internal,
        }
    }
}

impl From<DecodeError> for PipelineError {
    fn from(error: DecodeError) -> Self {
        match error {
            DecodeError::UnsupportedContentType { content_type } => {
                Self::UnsupportedContentType { content_type }
            }
            DecodeError::MalformedPayload { message } => Self::MalformedPayload { message },
        }
    }
}

impl From<ClassifyError> for PipelineError {
    fn from(error: ClassifyError) -> Self {
        match error {
            ClassifyError::UnhandledEventType { event_type } => {
                Self::UnhandledEventType { event_type }
            }
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// The webhook processing pipeline.
///
/// Holds the webhook signing secret and the injected metrics sink; both are
/// constructed once at startup. The pipeline itself keeps no per-invocation
/// state, so a single instance is shared across concurrent requests.
pub struct WebhookPipeline {
    secret: SecretValue,
    sink: Arc<dyn MetricsSink>,
}

impl WebhookPipeline {
    /// Create a pipeline with the given signing secret and sink.
    pub fn new(secret: SecretValue, sink: Arc<dyn MetricsSink>) -> Self {
        Self { secret, sink }
    }

    /// Process one webhook request end to end.
    ///
    /// Returns the extracted version tag when the event was a semantic
    /// version tag creation, `Ok(None)` when the event was handled but had
    /// nothing to report (branch creations, informational events, non-semver
    /// tags), and an error otherwise.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::SignatureInvalid`] for any verification failure
    /// - [`PipelineError::UnsupportedContentType`] /
    ///   [`PipelineError::MalformedPayload`] for structurally bad bodies
    /// - [`PipelineError::UnhandledEventType`] for event types outside the
    ///   registry
    /// - [`PipelineError::MetricSubmission`] when the sink rejects the point
    #[instrument(skip(self, request), fields(
        event_type = %request.event_type(),
        delivery_id = %request.delivery_id(),
    ))]
    pub async fn process(
        &self,
        request: &WebhookRequest,
    ) -> Result<Option<VersionTag>, PipelineError> {
        let payload = verify_signature(
            &request.body,
            request.headers.signature_sha256.as_deref(),
            request.headers.signature_sha1.as_deref(),
            self.secret.expose().as_bytes(),
        )
        .map_err(|_| {
            warn!("Rejecting webhook with unverifiable signature");
            PipelineError::SignatureInvalid
        })?;

        let event = decode_event(
            request.event_type(),
            &payload,
            &request.headers.content_type,
        )?;

        let tag = classify(&event)?;

        if let Some(tag) = &tag {
            let point = MetricDataPoint::version_count(tag, Timestamp::now());
            self.sink.submit(point).await?;
            info!(version = %tag, "Submitted deployment version metric");
        }

        Ok(tag)
    }
}

impl std::fmt::Debug for WebhookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookPipeline")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
