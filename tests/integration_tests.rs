//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config file → auth → paginated requests → records

use futures::StreamExt;
use serde_json::{json, Value};
use std::io::Write;
use tap_chargebacks::cli::{Cli, Runner};
use tap_chargebacks::streams::{alerts, chargebacks};
use tap_chargebacks::{Error, Record, RecordStream, SyncEngine, TapConfig};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHARGEBACKS_PATH: &str = "/clients/FIXD_Automotive_Inc/chargebacks";
const ALERTS_PATH: &str = "/clients/FIXD_Automotive_Inc/alerts";

// ============================================================================
// Helpers
// ============================================================================

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"accessToken": "it-token"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CHARGEBACKS_PATH))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 101, "case_number": "CB-101", "amount": 49.99},
                {"id": 102, "case_number": "CB-102", "amount": 19.0}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CHARGEBACKS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 103, "case_number": "CB-103", "amount": 5.5}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CHARGEBACKS_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ALERTS_PATH))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "al-1", "type": "ethoca"}],
            "pagination": {"current_page": 1, "total_pages": 2}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ALERTS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "al-2", "type": "verifi"}],
            "pagination": {"current_page": 2, "total_pages": 2}
        })))
        .mount(&server)
        .await;

    server
}

async fn drain(mut stream: RecordStream) -> (Vec<Record>, Option<Error>, RecordStream) {
    let mut records = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => records.push(record),
            Err(e) => return (records, Some(e), stream),
        }
    }
    (records, None, stream)
}

fn ids(records: &[Record]) -> Vec<Value> {
    records.iter().map(|r| r.data["id"].clone()).collect()
}

// ============================================================================
// Engine
// ============================================================================

#[tokio::test]
async fn test_sync_from_yaml_config_file() {
    let server = mock_api().await;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "user: alice\npassword: s3cret\nmerchant_id: fixd\nstart_date: \"2024-01-01\"\nbase_url: {}\n",
        server.uri()
    )
    .unwrap();

    let config = TapConfig::from_file(file.path()).unwrap();
    let engine = SyncEngine::new(config);

    let (records, error, stream) = drain(engine.extract(&chargebacks()).unwrap()).await;
    assert!(error.is_none());
    assert_eq!(ids(&records), vec![json!(101), json!(102), json!(103)]);
    assert_eq!(records[0].data["case_number"], "CB-101");

    let stats = stream.stats();
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.records, 3);
}

#[tokio::test]
async fn test_streams_run_concurrently_and_independently() {
    let server = mock_api().await;
    let config = TapConfig::new("alice", "s3cret", "fixd")
        .with_base_url(server.uri())
        .with_start_date("2024-01-01T00:00:00Z");
    let engine = SyncEngine::new(config);

    let (alerts_result, chargebacks_result) = tokio::join!(
        drain(engine.extract(&alerts()).unwrap()),
        drain(engine.extract(&chargebacks()).unwrap())
    );

    let (alert_records, alert_error, _) = alerts_result;
    let (chargeback_records, chargeback_error, _) = chargebacks_result;

    assert!(alert_error.is_none());
    assert!(chargeback_error.is_none());
    assert_eq!(ids(&alert_records), vec![json!("al-1"), json!("al-2")]);
    assert_eq!(chargeback_records.len(), 3);
    assert!(alert_records.iter().all(|r| r.stream == "alerts"));
    assert!(chargeback_records.iter().all(|r| r.stream == "chargebacks"));
}

#[tokio::test]
async fn test_user_agent_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"accessToken": "t"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ALERTS_PATH))
        .and(header("User-Agent", "fixd-tap/2.0"))
        .and(header("Authorization", "Bearer t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1}],
            "pagination": {"current_page": 1, "total_pages": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = TapConfig::new("u", "p", "m")
        .with_base_url(server.uri())
        .with_user_agent("fixd-tap/2.0");

    let (records, error, _) = drain(SyncEngine::new(config).extract(&alerts()).unwrap()).await;
    assert!(error.is_none());
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"accessToken": "t"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ALERTS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ALERTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1}, {"id": 2}],
            "pagination": {"current_page": 1, "total_pages": 1}
        })))
        .mount(&server)
        .await;

    let mut config = TapConfig::new("u", "p", "m").with_base_url(server.uri());
    config.requests_per_second = Some(50);

    let (records, error, stream) =
        drain(SyncEngine::new(config).extract(&alerts()).unwrap()).await;
    assert!(error.is_none());
    assert_eq!(records.len(), 2);
    assert_eq!(stream.stats().page_retries, vec![1]);
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_stream() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"accessToken": "t"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ALERTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = TapConfig::new("u", "p", "m").with_base_url(server.uri());
    config.max_retries = 2;
    config.initial_backoff_ms = 1;

    let (records, error, _) = drain(SyncEngine::new(config).extract(&alerts()).unwrap()).await;
    assert!(records.is_empty());

    let error = error.unwrap();
    assert!(matches!(error.root(), Error::HttpStatus { status: 503, .. }));
    assert!(error.to_string().contains("alerts"));
}

// ============================================================================
// CLI Runner
// ============================================================================

#[tokio::test]
async fn test_runner_reads_all_streams_from_config_file() {
    let server = mock_api().await;

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        "{}",
        json!({
            "user": "alice",
            "password": "s3cret",
            "merchant_id": "fixd",
            "start_date": "2024-01-01T00:00:00Z",
            "base_url": server.uri()
        })
    )
    .unwrap();

    let config_path = file.path().to_string_lossy().to_string();
    let cli = <Cli as clap::Parser>::try_parse_from([
        "tap-chargebacks",
        "--config",
        config_path.as_str(),
        "read",
    ])
    .unwrap();

    let mut out = Vec::new();
    Runner::new(cli).run_with_output(&mut out).await.unwrap();

    let messages: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let summary: Vec<(String, String)> = messages
        .iter()
        .map(|m| {
            (
                m["type"].as_str().unwrap_or_default().to_string(),
                m["stream"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    let expected: Vec<(String, String)> = [
        ("SCHEMA", "alerts"),
        ("RECORD", "alerts"),
        ("RECORD", "alerts"),
        ("SCHEMA", "chargebacks"),
        ("RECORD", "chargebacks"),
        ("RECORD", "chargebacks"),
        ("RECORD", "chargebacks"),
    ]
    .iter()
    .map(|(t, s)| ((*t).to_string(), (*s).to_string()))
    .collect();

    assert_eq!(summary, expected);
}
