//! Semantic version extraction from tag names.
//!
//! Tag names arriving from the upstream source are loosely structured; most
//! deployment tags follow `vMAJOR.MINOR.PATCH[-PRERELEASE]`, but branch-like
//! names (`test-automation`) appear in the same stream. Extraction therefore
//! soft-fails: a tag that is not a well-formed semantic version yields `None`
//! and is ignored, never escalated.

use serde::Serialize;
use std::fmt;

/// A parsed and validated deployment version tag.
///
/// `raw` preserves the tag name verbatim, including any leading `v` and any
/// build metadata, so the original string can be reported as a metric tag.
/// `prerelease` is empty exactly when the version is a release rather than a
/// release candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionTag {
    /// The tag name exactly as received.
    pub raw: String,
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Prerelease label, empty for releases.
    pub prerelease: String,
}

impl VersionTag {
    /// Parse a tag name as a strict semantic version.
    ///
    /// A single leading `v` or `V` is stripped before parsing. The remainder
    /// must match `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`: three decimal
    /// components without leading zeros, an optional prerelease of
    /// dot-separated `[0-9A-Za-z-]` identifiers, and optional build metadata
    /// which is validated and then discarded.
    ///
    /// Returns `None` for anything else. Malformed tags are a normal part of
    /// the input stream, not an error.
    pub fn extract(tag: &str) -> Option<Self> {
        let unprefixed = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);

        let (versioned, build) = match unprefixed.split_once('+') {
            Some((v, b)) => (v, Some(b)),
            None => (unprefixed, None),
        };

        if let Some(build) = build {
            if !valid_identifiers(build, true) {
                return None;
            }
        }

        let (core, prerelease) = match versioned.split_once('-') {
            Some((c, p)) => (c, p),
            None => (versioned, ""),
        };

        if !prerelease.is_empty() && !valid_identifiers(prerelease, false) {
            return None;
        }

        let mut parts = core.split('.');
        let major = parse_numeric(parts.next()?)?;
        let minor = parse_numeric(parts.next()?)?;
        let patch = parse_numeric(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            raw: tag.to_string(),
            major,
            minor,
            patch,
            prerelease: prerelease.to_string(),
        })
    }

    /// Whether this version carries a prerelease label.
    pub fn is_release_candidate(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// The `vMAJOR.MINOR` form used for metric labels.
    pub fn short_version(&self) -> String {
        format!("v{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Parse one numeric version component: decimal digits, no leading zeros.
fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse::<u64>().ok()
}

/// Validate a dot-separated identifier sequence (prerelease or build).
///
/// Identifiers must be non-empty and drawn from `[0-9A-Za-z-]`. Purely
/// numeric prerelease identifiers must not carry leading zeros; build
/// metadata identifiers may.
fn valid_identifiers(segment: &str, allow_leading_zeros: bool) -> bool {
    segment.split('.').all(|ident| {
        if ident.is_empty() {
            return false;
        }
        if !ident
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return false;
        }
        if !allow_leading_zeros
            && ident.len() > 1
            && ident.starts_with('0')
            && ident.bytes().all(|b| b.is_ascii_digit())
        {
            return false;
        }
        true
    })
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
