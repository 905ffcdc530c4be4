//! Event classification.
//!
//! The single decision point determining whether an invocation emits a
//! metric. Tag creations go to version extraction; branch creations and the
//! informational `push`/`status` events are logged and dropped; anything
//! outside the registry is the one hard failure.

use crate::events::DecodedEvent;
use crate::version::VersionTag;
use tracing::{debug, info};

/// Error for events the service recognizes as outside its contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("unhandled event type: {event_type}")]
    UnhandledEventType { event_type: String },
}

/// Classify a decoded event, producing at most one version tag.
///
/// Pure function of its input: re-running classification on the same event
/// yields the same result.
///
/// - `create` with `ref_type == "tag"` runs [`VersionTag::extract`]; a tag
///   that is not a semantic version yields `Ok(None)` (soft fail).
/// - `create` for branches, and `push`/`status`, yield `Ok(None)`.
/// - [`DecodedEvent::Unknown`] is a sender/contract mismatch and fails with
///   [`ClassifyError::UnhandledEventType`].
pub fn classify(event: &DecodedEvent) -> Result<Option<VersionTag>, ClassifyError> {
    match event {
        DecodedEvent::Create(create) if create.ref_type == "tag" => {
            let tag = VersionTag::extract(&create.git_ref);
            match &tag {
                Some(version) => info!(
                    tag = %create.git_ref,
                    version = %version,
                    release_candidate = version.is_release_candidate(),
                    "Extracted version from tag creation"
                ),
                None => info!(
                    tag = %create.git_ref,
                    "Ignoring tag that is not a semantic version"
                ),
            }
            Ok(tag)
        }
        DecodedEvent::Create(create) => {
            debug!(
                git_ref = %create.git_ref,
                ref_type = %create.ref_type,
                "Ignoring create event for non-tag ref"
            );
            Ok(None)
        }
        DecodedEvent::Push(push) => {
            info!(git_ref = %push.git_ref, "Observed push event");
            Ok(None)
        }
        DecodedEvent::Status(status) => {
            info!(sha = %status.sha, state = %status.state, "Observed status event");
            Ok(None)
        }
        DecodedEvent::Unknown { event_type } => Err(ClassifyError::UnhandledEventType {
            event_type: event_type.clone(),
        }),
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
