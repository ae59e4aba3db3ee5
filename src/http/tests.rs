//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use crate::types::BackoffType;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(max_retries: u32) -> HttpClientConfigBuilder {
    HttpClientConfig::builder()
        .max_retries(max_retries)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
}

fn fast_client(max_retries: u32) -> HttpClient {
    HttpClient::with_config(fast_config(max_retries).build()).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.backoff_type, BackoffType::Exponential);
    assert!(config.requests_per_second.is_none());
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .requests_per_second(Some(2))
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(config.requests_per_second, Some(2));
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("page", "2")
        .query("limit", "100")
        .header("User-Agent", "tap/1.0");

    assert_eq!(config.query.get("page"), Some(&"2".to_string()));
    assert_eq!(config.query.get("limit"), Some(&"100".to_string()));
    assert_eq!(config.headers.get("User-Agent"), Some(&"tap/1.0".to_string()));
}

#[tokio::test]
async fn test_get_sends_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients/acme/chargebacks"))
        .and(query_param("page", "2"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(0);
    let result = client
        .get(
            &format!("{}/clients/acme/chargebacks", mock_server.uri()),
            RequestConfig::new()
                .query("page", "2")
                .header("Authorization", "Bearer tok"),
        )
        .await
        .unwrap();

    assert_eq!(result.response.status(), 200);
    assert_eq!(result.retries, 0);
}

#[tokio::test]
async fn test_retry_on_500_reports_retry_count() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = fast_client(3);
    let result = client
        .get(&format!("{}/api/flaky", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(result.response.status(), 200);
    assert_eq!(result.retries, 2);
}

#[tokio::test]
async fn test_rate_limit_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let result = client
        .get(&format!("{}/api/limited", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(result.response.status(), 200);
    assert_eq!(result.retries, 1);
}

#[tokio::test]
async fn test_rate_limited_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = fast_client(1);
    let err = client
        .get(&format!("{}/api/limited", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RateLimited { .. }));
}

#[tokio::test]
async fn test_max_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let err = client
        .get(
            &format!("{}/api/always-fail", mock_server.uri()),
            RequestConfig::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(3);
    let err = client
        .get(
            &format!("{}/api/forbidden", mock_server.uri()),
            RequestConfig::new(),
        )
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Forbidden");
        }
        other => panic!("Expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = fast_config(2).timeout(Duration::from_millis(100)).build();
    let client = HttpClient::with_config(config).unwrap();
    let result = client
        .get(&format!("{}/api/slow", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(result.retries, 1);
}

#[test]
fn test_calculate_backoff_constant() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_linear() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_respects_max() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));
    assert_eq!(client.calculate_backoff(40), Duration::from_millis(500));
}

#[test]
fn test_http_client_debug_shows_rate_limit() {
    let unthrottled = format!("{:?}", fast_client(0));
    assert!(unthrottled.contains("rate_limit: None"));

    let config = fast_config(0).requests_per_second(Some(10)).build();
    let throttled = format!("{:?}", HttpClient::with_config(config).unwrap());
    assert!(throttled.contains("HttpClient"));
    assert!(throttled.contains("rate_limit: Some(10)"));
}
