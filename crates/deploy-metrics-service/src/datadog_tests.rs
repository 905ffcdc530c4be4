//! Tests for the Datadog metrics sink.
//!
//! Wire-level behaviour is exercised against a wiremock intake; the
//! endpoint override in [`DatadogConfig`] exists for exactly this.

use super::*;
use crate::config::DatadogConfig;
use deploy_metrics_core::{Timestamp, VersionTag};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sink_for(endpoint: String) -> DatadogMetricsSink {
    let config = DatadogConfig {
        site: "datadoghq.com".to_string(),
        api_key: None,
        endpoint: Some(endpoint),
    };
    DatadogMetricsSink::new(&config, SecretValue::new("test-api-key"))
}

fn rc_point() -> MetricDataPoint {
    let tag = VersionTag::extract("v1.41.0-RC-7967-2022-08-19T19-07-00").unwrap();
    MetricDataPoint::version_count(&tag, Timestamp::now())
}

// ============================================================================
// Wire format
// ============================================================================

mod wire_format_tests {
    use super::*;

    /// The intake body carries the fixed metric name, the count intake
    /// type, the resource labels, and the derived tag set.
    #[test]
    fn test_series_payload_shape() {
        let payload = SeriesPayload::from_point(&rc_point());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json["series"][0]["metric"],
            serde_json::json!("deployment.metrics.versions")
        );
        assert_eq!(json["series"][0]["type"], serde_json::json!(1));
        assert_eq!(json["series"][0]["points"][0]["value"], serde_json::json!(1.0));
        assert_eq!(
            json["series"][0]["resources"][0],
            serde_json::json!({"name": "enterprise", "type": "version"})
        );

        let tags = json["series"][0]["tags"].as_array().unwrap();
        assert!(tags.contains(&serde_json::json!("RC")));
        assert!(tags.contains(&serde_json::json!("version:v1.41")));
    }
}

// ============================================================================
// Submission behaviour
// ============================================================================

mod submission_tests {
    use super::*;

    /// A point is POSTed to the series endpoint with the API key header.
    #[tokio::test]
    async fn test_submits_series_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/series"))
            .and(header("DD-API-KEY", "test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "series": [{"metric": "deployment.metrics.versions", "type": 1}]
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(server.uri());
        sink.submit(rc_point()).await.expect("submission should succeed");
    }

    /// A rejection from the intake surfaces with its status code.
    #[tokio::test]
    async fn test_auth_rejection_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/series"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let sink = sink_for(server.uri());
        let error = sink.submit(rc_point()).await.unwrap_err();
        assert!(
            matches!(error, SubmissionError::Rejected { status: 403, .. }),
            "expected Rejected with status 403, got {:?}",
            error
        );
    }

    /// An unreachable intake surfaces as a transport failure.
    #[tokio::test]
    async fn test_unreachable_intake_is_transport_failure() {
        // Port 9 (discard) is closed in the test environment.
        let sink = sink_for("http://127.0.0.1:9".to_string());
        let error = sink.submit(rc_point()).await.unwrap_err();
        assert!(matches!(error, SubmissionError::Transport { .. }));
    }
}

// ============================================================================
// Hygiene
// ============================================================================

mod hygiene_tests {
    use super::*;

    /// The sink's Debug output must not reveal the API key.
    #[test]
    fn test_debug_redacts_api_key() {
        let sink = sink_for("http://127.0.0.1:8126".to_string());
        let debug_str = format!("{:?}", sink);
        assert!(!debug_str.contains("test-api-key"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
