//! Tests for [`SecretValue`].

use super::*;

/// `expose` returns the wrapped value verbatim.
#[test]
fn test_expose_returns_raw_value() {
    let secret = SecretValue::new("hunter2");
    assert_eq!(secret.expose(), "hunter2");
}

/// The `Debug` output must not reveal the secret.
#[test]
fn test_debug_redacts_secret() {
    let secret = SecretValue::new("top-secret-value");
    let debug_str = format!("{:?}", secret);

    assert!(
        !debug_str.contains("top-secret-value"),
        "secret must not appear in debug output; got: {}",
        debug_str
    );
    assert!(
        debug_str.contains("<REDACTED>"),
        "debug output should contain <REDACTED>; got: {}",
        debug_str
    );
}

/// The `Display` output must not reveal the secret either.
#[test]
fn test_display_redacts_secret() {
    let secret = SecretValue::new("top-secret-value");
    assert_eq!(secret.to_string(), "<REDACTED>");
}

/// Emptiness is detectable so startup can reject unusable configuration.
#[test]
fn test_is_empty() {
    assert!(SecretValue::new("").is_empty());
    assert!(!SecretValue::new("x").is_empty());
}
