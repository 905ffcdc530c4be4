//! Secret material handling.
//!
//! Provides [`SecretValue`], the container used for the webhook signing
//! secret and the metrics-provider API credential. Both are resolved once at
//! startup by the hosting binary and held only in memory for the process
//! lifetime.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secure container for secret values.
///
/// The wrapped value is zeroed on drop and never appears in `Debug` or
/// `Display` output. Access to the raw secret requires an explicit call to
/// [`SecretValue::expose`], which keeps accidental logging greppable.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue {
    value: String,
}

impl SecretValue {
    /// Wrap a raw secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Access the raw secret.
    ///
    /// Call sites should pass the result straight into the consuming
    /// operation (HMAC keying, an auth header) and not store it.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Whether the secret is empty.
    ///
    /// An empty secret is a configuration fault; callers reject it at
    /// startup rather than letting verification fail on every request.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValue")
            .field("value", &"<REDACTED>")
            .finish()
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<REDACTED>")
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
