//! Webhook signature verification.
//!
//! Provides HMAC signature validation for inbound webhooks using
//! constant-time comparison to prevent timing attacks. Two schemes are
//! supported: HMAC-SHA256 (`X-Hub-Signature-256`, preferred) and the legacy
//! HMAC-SHA1 (`X-Hub-Signature`), with the SHA-256 header winning whenever
//! it carries a value.
//!
//! # Security
//!
//! - Uses constant-time comparison via the `subtle` crate
//! - Error values carry no secret or signature material
//! - An empty header value counts as absent, so a blank SHA-256 header
//!   still falls back to SHA-1

use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

// ============================================================================
// Types
// ============================================================================

/// Hash scheme implied by the selected signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// HMAC-SHA256, the `sha256=<hex>` format.
    Sha256,
    /// HMAC-SHA1, the legacy `sha1=<hex>` format.
    Sha1,
}

impl SignatureScheme {
    /// The header-value prefix for this scheme.
    fn prefix(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256=",
            Self::Sha1 => "sha1=",
        }
    }
}

/// Raw bytes proven authentic by signature verification.
///
/// The only way to construct one is through [`verify_signature`]; downstream
/// stages take this type instead of `&[u8]` so that an unverified body can
/// never reach the event decoder.
#[derive(Debug, Clone)]
pub struct VerifiedPayload(Bytes);

impl VerifiedPayload {
    /// The authenticated body bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Test-only constructor bypassing verification.
    #[cfg(test)]
    pub(crate) fn for_tests(body: Bytes) -> Self {
        Self(body)
    }
}

/// Errors during signature verification.
///
/// Variants are deliberately uninformative: nothing here names the secret,
/// the presented signature, or the computed digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("no signature header present")]
    MissingSignature,

    #[error("signature header is not a valid hex digest")]
    MalformedSignature,

    #[error("signature digest does not match")]
    DigestMismatch,

    #[error("HMAC computation failed")]
    HmacError,
}

// ============================================================================
// Verification
// ============================================================================

/// Verify a raw webhook body against its signature headers.
///
/// Selects the SHA-256 header when present and non-empty, otherwise the
/// SHA-1 header. The scheme prefix (`sha256=` / `sha1=`) is stripped when
/// present, the digest hex-decoded, and the HMAC of `body` keyed by `secret`
/// compared in constant time.
///
/// # Errors
///
/// - [`SignatureError::MissingSignature`] when neither header carries a value
/// - [`SignatureError::MalformedSignature`] when the digest is not valid hex
/// - [`SignatureError::DigestMismatch`] when the HMAC does not match
pub fn verify_signature(
    body: &Bytes,
    signature_sha256: Option<&str>,
    signature_sha1: Option<&str>,
    secret: &[u8],
) -> Result<VerifiedPayload, SignatureError> {
    let (scheme, header_value) = select_scheme(signature_sha256, signature_sha1)
        .ok_or(SignatureError::MissingSignature)?;

    let presented = decode_digest(scheme, header_value)?;
    let computed = compute_hmac(scheme, body, secret)?;

    if constant_time_eq(&presented, &computed) {
        Ok(VerifiedPayload(body.clone()))
    } else {
        Err(SignatureError::DigestMismatch)
    }
}

/// Pick the strongest scheme that has a non-empty header value.
fn select_scheme<'a>(
    signature_sha256: Option<&'a str>,
    signature_sha1: Option<&'a str>,
) -> Option<(SignatureScheme, &'a str)> {
    let non_empty = |value: Option<&'a str>| value.filter(|v| !v.is_empty());

    if let Some(value) = non_empty(signature_sha256) {
        return Some((SignatureScheme::Sha256, value));
    }
    non_empty(signature_sha1).map(|value| (SignatureScheme::Sha1, value))
}

/// Strip the scheme prefix when present and hex-decode the digest.
fn decode_digest(scheme: SignatureScheme, value: &str) -> Result<Vec<u8>, SignatureError> {
    let hex_part = value.strip_prefix(scheme.prefix()).unwrap_or(value);
    hex::decode(hex_part).map_err(|_| SignatureError::MalformedSignature)
}

/// Compute the HMAC of `body` under the selected scheme.
fn compute_hmac(
    scheme: SignatureScheme,
    body: &[u8],
    secret: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    match scheme {
        SignatureScheme::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::HmacError)?;
            mac.update(body);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        SignatureScheme::Sha1 => {
            let mut mac =
                HmacSha1::new_from_slice(secret).map_err(|_| SignatureError::HmacError)?;
            mac.update(body);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

/// Constant-time comparison of digests.
///
/// The length check short-circuits; digest lengths are public information.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
