//! Tests for the HTTP surface.
//!
//! Drives the full router with axum-test: signed requests in, status codes
//! out, with a hand-written sink standing in for Datadog.

use super::*;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use deploy_metrics_core::{
    MetricDataPoint, MetricsSink, SecretValue, SubmissionError, WebhookPipeline,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Mutex;

const SECRET: &str = "http-test-secret";

// ============================================================================
// Fakes and helpers
// ============================================================================

#[derive(Default)]
struct RecordingSink {
    points: Mutex<Vec<MetricDataPoint>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl MetricsSink for RecordingSink {
    async fn submit(&self, point: MetricDataPoint) -> Result<(), SubmissionError> {
        self.points.lock().unwrap().push(point);
        Ok(())
    }
}

struct FailingSink;

#[async_trait::async_trait]
impl MetricsSink for FailingSink {
    async fn submit(&self, _point: MetricDataPoint) -> Result<(), SubmissionError> {
        Err(SubmissionError::Transport {
            message: "connection reset".to_string(),
        })
    }
}

fn server_with(sink: Arc<dyn MetricsSink>) -> TestServer {
    let pipeline = Arc::new(WebhookPipeline::new(SecretValue::new(SECRET), sink));
    TestServer::new(router(AppState { pipeline })).expect("router should start")
}

fn sha256_signature(secret: &str, payload: &[u8]) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn header_name(name: &'static str) -> HeaderName {
    HeaderName::from_static(name)
}

// ============================================================================
// Webhook endpoint
// ============================================================================

mod webhook_endpoint_tests {
    use super::*;

    /// A signed tag-creation request returns 204 and reaches the sink.
    #[tokio::test]
    async fn test_signed_tag_creation_returns_no_content() {
        let sink = Arc::new(RecordingSink::default());
        let server = server_with(sink.clone());
        let body = r#"{"ref": "v1.40.14", "ref_type": "tag"}"#;

        let response = server
            .post("/webhook")
            .add_header(header_name("x-github-event"), HeaderValue::from_static("create"))
            .add_header(
                header_name("x-hub-signature-256"),
                HeaderValue::from_str(&sha256_signature(SECRET, body.as_bytes())).unwrap(),
            )
            .content_type("application/json")
            .bytes(body.as_bytes().to_vec().into())
            .await;

        response.assert_status(axum::http::StatusCode::NO_CONTENT);
        assert_eq!(sink.count(), 1, "the metric must reach the sink");
    }

    /// Informational events also return 204, with nothing submitted.
    #[tokio::test]
    async fn test_push_event_returns_no_content_without_metric() {
        let sink = Arc::new(RecordingSink::default());
        let server = server_with(sink.clone());
        let body = r#"{"ref": "refs/heads/main"}"#;

        let response = server
            .post("/webhook")
            .add_header(header_name("x-github-event"), HeaderValue::from_static("push"))
            .add_header(
                header_name("x-hub-signature-256"),
                HeaderValue::from_str(&sha256_signature(SECRET, body.as_bytes())).unwrap(),
            )
            .content_type("application/json")
            .bytes(body.as_bytes().to_vec().into())
            .await;

        response.assert_status(axum::http::StatusCode::NO_CONTENT);
        assert_eq!(sink.count(), 0);
    }

    /// A bad signature maps to 400.
    #[tokio::test]
    async fn test_bad_signature_returns_bad_request() {
        let server = server_with(Arc::new(RecordingSink::default()));
        let body = r#"{"ref": "v1.0.0", "ref_type": "tag"}"#;

        let response = server
            .post("/webhook")
            .add_header(header_name("x-github-event"), HeaderValue::from_static("create"))
            .add_header(
                header_name("x-hub-signature-256"),
                HeaderValue::from_str(&sha256_signature("wrong-secret", body.as_bytes())).unwrap(),
            )
            .content_type("application/json")
            .bytes(body.as_bytes().to_vec().into())
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    /// An event type outside the contract maps to 400, not 500.
    #[tokio::test]
    async fn test_unknown_event_type_returns_bad_request() {
        let server = server_with(Arc::new(RecordingSink::default()));
        let body = r#"{"action": "completed"}"#;

        let response = server
            .post("/webhook")
            .add_header(
                header_name("x-github-event"),
                HeaderValue::from_static("workflow_run"),
            )
            .add_header(
                header_name("x-hub-signature-256"),
                HeaderValue::from_str(&sha256_signature(SECRET, body.as_bytes())).unwrap(),
            )
            .content_type("application/json")
            .bytes(body.as_bytes().to_vec().into())
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    /// A request without the event-type header maps to 400.
    #[tokio::test]
    async fn test_missing_event_header_returns_bad_request() {
        let server = server_with(Arc::new(RecordingSink::default()));

        let response = server
            .post("/webhook")
            .content_type("application/json")
            .bytes(br#"{"ref": "v1.0.0"}"#.to_vec().into())
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    /// A sink outage maps to 500.
    #[tokio::test]
    async fn test_sink_failure_returns_internal_error() {
        let server = server_with(Arc::new(FailingSink));
        let body = r#"{"ref": "v2.0.0", "ref_type": "tag"}"#;

        let response = server
            .post("/webhook")
            .add_header(header_name("x-github-event"), HeaderValue::from_static("create"))
            .add_header(
                header_name("x-hub-signature-256"),
                HeaderValue::from_str(&sha256_signature(SECRET, body.as_bytes())).unwrap(),
            )
            .content_type("application/json")
            .bytes(body.as_bytes().to_vec().into())
            .await;

        response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// A form-encoded delivery carrying `payload=<json>` behaves like JSON.
    #[tokio::test]
    async fn test_form_encoded_delivery_accepted() {
        let sink = Arc::new(RecordingSink::default());
        let server = server_with(sink.clone());

        let document = r#"{"ref": "v2.1.0", "ref_type": "tag"}"#;
        let body = format!(
            "payload={}",
            url_encode(document.as_bytes())
        );

        let response = server
            .post("/webhook")
            .add_header(header_name("x-github-event"), HeaderValue::from_static("create"))
            .add_header(
                header_name("x-hub-signature-256"),
                HeaderValue::from_str(&sha256_signature(SECRET, body.as_bytes())).unwrap(),
            )
            .content_type("application/x-www-form-urlencoded")
            .bytes(body.into_bytes().into())
            .await;

        response.assert_status(axum::http::StatusCode::NO_CONTENT);
        assert_eq!(sink.count(), 1);
    }

    /// Percent-encode a byte string for a form field value.
    fn url_encode(bytes: &[u8]) -> String {
        let mut encoded = String::new();
        for &b in bytes {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    encoded.push(b as char)
                }
                _ => encoded.push_str(&format!("%{:02X}", b)),
            }
        }
        encoded
    }
}

// ============================================================================
// Health endpoint
// ============================================================================

mod health_endpoint_tests {
    use super::*;

    /// The liveness probe reports the service name and version.
    #[tokio::test]
    async fn test_health_reports_service_identity() {
        let server = server_with(Arc::new(RecordingSink::default()));

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "deploy-metrics-service");
    }
}
