//! Webhook event decoding.
//!
//! Turns a signature-verified payload into a [`DecodedEvent`], the closed
//! tagged union the classifier matches on. The event kind is declared by the
//! `X-GitHub-Event` header and resolved against a fixed registry with an
//! exact, case-sensitive match; unrecognized values decode to
//! [`DecodedEvent::Unknown`] so that the classifier — not the parser — owns
//! the decision to reject them.
//!
//! The payload itself may arrive as JSON directly (`application/json`) or as
//! JSON nested inside the `payload` field of a form-encoded body
//! (`application/x-www-form-urlencoded`); both are unwrapped here.

use crate::webhook::signature::VerifiedPayload;
use serde::Deserialize;

/// Content types this service accepts, after parameter stripping.
const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

// ============================================================================
// Event Payload Types
// ============================================================================

/// Payload of a `create` event: a branch or tag was created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateEvent {
    /// The created ref name (tag name or branch name).
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Either `"tag"` or `"branch"`.
    pub ref_type: String,
}

/// Payload of a `push` event. Informational only; never produces a metric.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    /// The full ref that was pushed (e.g. `refs/heads/main`).
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Commit SHA before the push.
    pub before: Option<String>,
    /// Commit SHA after the push.
    pub after: Option<String>,
}

/// Payload of a `status` event. Informational only; never produces a metric.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusEvent {
    /// Commit SHA the status applies to.
    pub sha: String,
    /// One of `pending`, `success`, `failure`, `error`.
    pub state: String,
    /// The status context label, when present.
    pub context: Option<String>,
}

/// A decoded webhook event.
///
/// Closed union over the supported event kinds. Exhaustive matching at the
/// classifier makes "recognized but uninteresting" versus "not recognized at
/// all" a compile-checked distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    /// A `create` event (branch or tag creation).
    Create(CreateEvent),
    /// A `push` event.
    Push(PushEvent),
    /// A `status` event.
    Status(StatusEvent),
    /// An event type outside the registry.
    Unknown {
        /// The unrecognized event-type header value.
        event_type: String,
    },
}

impl DecodedEvent {
    /// Short kind label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Push(_) => "push",
            Self::Status(_) => "status",
            Self::Unknown { .. } => "unknown",
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors while decoding a verified payload into an event
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("malformed payload: {message}")]
    MalformedPayload { message: String },
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a verified payload into a [`DecodedEvent`].
///
/// `event_type` is the raw `X-GitHub-Event` header value; `content_type` the
/// raw `Content-Type` header value, parameters included.
///
/// # Errors
///
/// Returns [`DecodeError::UnsupportedContentType`] when the content type
/// resolves to neither JSON nor form-encoded, and
/// [`DecodeError::MalformedPayload`] when the body cannot be deserialized
/// into the structure the matched event kind implies. An unrecognized
/// `event_type` is NOT an error here; it decodes to
/// [`DecodedEvent::Unknown`].
pub fn decode_event(
    event_type: &str,
    payload: &VerifiedPayload,
    content_type: &str,
) -> Result<DecodedEvent, DecodeError> {
    let json = unwrap_payload(payload.as_bytes(), content_type)?;

    let event = match event_type {
        "create" => DecodedEvent::Create(deserialize_event(json)?),
        "push" => DecodedEvent::Push(deserialize_event(json)?),
        "status" => DecodedEvent::Status(deserialize_event(json)?),
        other => DecodedEvent::Unknown {
            event_type: other.to_string(),
        },
    };

    Ok(event)
}

/// Reduce a `Content-Type` header value to its media type: parameters such
/// as `charset` are stripped and the result is lowercased.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Extract the JSON document from the body according to the content type.
fn unwrap_payload(body: &[u8], content_type: &str) -> Result<serde_json::Value, DecodeError> {
    let text = match media_type(content_type).as_str() {
        CONTENT_TYPE_JSON => String::from_utf8(body.to_vec()).map_err(|_| {
            DecodeError::MalformedPayload {
                message: "body is not valid UTF-8".to_string(),
            }
        })?,
        CONTENT_TYPE_FORM => url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| DecodeError::MalformedPayload {
                message: "form body has no 'payload' field".to_string(),
            })?,
        other => {
            return Err(DecodeError::UnsupportedContentType {
                content_type: other.to_string(),
            })
        }
    };

    serde_json::from_str(&text).map_err(|e| DecodeError::MalformedPayload {
        message: format!("body is not valid JSON: {}", e),
    })
}

fn deserialize_event<T: for<'de> Deserialize<'de>>(
    json: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(json).map_err(|e| DecodeError::MalformedPayload {
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
