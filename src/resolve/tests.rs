//! Tests for the batch resolution module

use super::*;
use crate::error::{Error, FailureKind};
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::{CanonicalId, JsonObject};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().max_retries(0).no_rate_limit().build())
        .unwrap()
}

/// Client that gives up on a batch after 250ms
fn impatient_client() -> HttpClient {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_millis(250))
        .max_retries(0)
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn ids(n: usize) -> Vec<CanonicalId> {
    (0..n).map(|i| format!("id-{i}")).collect()
}

fn record_ids(records: &[JsonObject]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["canonicalId"].as_str().unwrap().to_string())
        .collect()
}

fn targets(request: &Request) -> Vec<String> {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    body["targets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap().to_string())
        .collect()
}

/// Answers each batch with its records in reverse order
struct Echo {
    as_map: bool,
    fail_on: Option<(&'static str, u16)>,
    slow_first: Option<Duration>,
    /// Batch whose first target never gets a timely answer
    stall_on: Option<&'static str>,
}

impl Echo {
    fn array() -> Self {
        Self {
            as_map: false,
            fail_on: None,
            slow_first: None,
            stall_on: None,
        }
    }
}

impl Respond for Echo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let targets = targets(request);

        if let Some((id, status)) = self.fail_on {
            if targets.first().is_some_and(|t| t == id) {
                return ResponseTemplate::new(status);
            }
        }

        let body = if self.as_map {
            let map: JsonObject = targets
                .iter()
                .rev()
                .map(|t| (t.clone(), json!({"canonicalId": t, "title": "x"})))
                .collect();
            Value::Object(map)
        } else {
            Value::Array(
                targets
                    .iter()
                    .rev()
                    .map(|t| json!({"canonicalId": t, "title": "x"}))
                    .collect(),
            )
        };

        let template = ResponseTemplate::new(200).set_body_json(body);
        if self.stall_on.is_some_and(|id| targets.first().is_some_and(|t| t == id)) {
            return template.set_delay(Duration::from_secs(2));
        }
        match self.slow_first {
            Some(delay) if targets.first().is_some_and(|t| t == "id-0") => {
                template.set_delay(delay)
            }
            _ => template,
        }
    }
}

// ============================================================================
// Partition Tests
// ============================================================================

#[test]
fn test_partition_sizes_and_order() {
    let batches = IdentifierBatch::partition(&ids(250), 100);

    assert_eq!(
        batches.iter().map(IdentifierBatch::len).collect::<Vec<_>>(),
        vec![100, 100, 50]
    );
    assert_eq!(batches[1].index, 1);
    assert_eq!(batches[1].ids[0], "id-100");
    let rejoined: Vec<CanonicalId> = batches.into_iter().flat_map(|b| b.ids).collect();
    assert_eq!(rejoined, ids(250));
}

#[test]
fn test_partition_empty_and_exact() {
    assert!(IdentifierBatch::partition(&[], 100).is_empty());
    assert_eq!(IdentifierBatch::partition(&ids(200), 100).len(), 2);
}

#[test]
fn test_request_body_context() {
    let batch = IdentifierBatch {
        index: 0,
        ids: vec!["a".to_string(), "b".to_string()],
    };

    assert_eq!(batch.request_body(None), json!({"targets": ["a", "b"]}));
    assert_eq!(
        batch.request_body(Some(&json!({"workspace": "w1"}))),
        json!({"context": {"workspace": "w1"}, "targets": ["a", "b"]})
    );
}

#[test]
fn test_batch_config_defaults() {
    let config: BatchConfig = serde_yaml::from_str("url: http://localhost/batch").unwrap();
    assert_eq!(config.capacity, 100);
    assert_eq!(config.concurrency, 2);
    assert!(config.context.is_none());
    assert_eq!(config.id_fields[0], "canonicalId");
}

// ============================================================================
// Response Shape Tests
// ============================================================================

#[test]
fn test_records_from_object() {
    let body = json!({
        "a": {"canonicalId": "a"},
        "meta": "skipped",
        "b": {"canonicalId": "b"}
    });
    let records = records_from_response("u", body).unwrap();
    assert_eq!(record_ids(&records), vec!["a", "b"]);
}

#[test]
fn test_records_from_array() {
    let body = json!([{"canonicalId": "a"}, 1, null, {"canonicalId": "b"}]);
    let records = records_from_response("u", body).unwrap();
    assert_eq!(record_ids(&records), vec!["a", "b"]);
}

#[test]
fn test_records_from_scalar_is_malformed() {
    let err = records_from_response("http://x/batch", json!("oops")).unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedResponse);
    assert!(err.to_string().contains("string"));
}

#[test]
fn test_order_by_request() {
    let records: Vec<JsonObject> = [
        json!({"name": "orphan"}),
        json!({"canonicalId": "c"}),
        json!({"id": "a"}),
        json!({"ticketCanonicalId": "b"}),
    ]
    .into_iter()
    .map(|v| v.as_object().unwrap().clone())
    .collect();
    let requested: Vec<CanonicalId> = vec!["a".into(), "b".into(), "c".into()];

    let ordered = order_by_request(records, &requested, &BatchConfig::default().id_fields);

    assert_eq!(ordered[0]["id"], "a");
    assert_eq!(ordered[1]["ticketCanonicalId"], "b");
    assert_eq!(ordered[2]["canonicalId"], "c");
    assert_eq!(ordered[3]["name"], "orphan");
}

// ============================================================================
// Resolver Tests
// ============================================================================

#[tokio::test]
async fn test_resolve_250_in_three_batches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .respond_with(Echo::array())
        .expect(3)
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(format!("{}/batch", server.uri())).with_concurrency(1);
    let records = BatchResolver::new(&client, &config)
        .resolve(&ids(250))
        .await
        .unwrap();

    assert_eq!(record_ids(&records), ids(250));

    let sizes: Vec<usize> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| targets(r).len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
}

#[tokio::test]
async fn test_resolve_map_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(Echo {
            as_map: true,
            ..Echo::array()
        })
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri()).with_capacity(2);
    let records = BatchResolver::new(&client, &config)
        .resolve(&ids(5))
        .await
        .unwrap();

    assert_eq!(record_ids(&records), ids(5));
}

#[tokio::test]
async fn test_resolve_sends_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"context": "ctx-1", "targets": ["a"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"canonicalId": "a"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri()).with_context(json!("ctx-1"));
    let records = BatchResolver::new(&client, &config)
        .resolve(&["a".to_string()])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_resolve_nothing_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(Echo::array())
        .expect(0)
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri());
    let records = BatchResolver::new(&client, &config).resolve(&[]).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_failed_second_batch_aborts_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(Echo {
            fail_on: Some(("id-100", 500)),
            ..Echo::array()
        })
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri()).with_concurrency(1);
    let err = BatchResolver::new(&client, &config)
        .resolve(&ids(250))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    // the third batch is never requested
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_second_batch_timeout_aborts_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(Echo {
            stall_on: Some("id-100"),
            ..Echo::array()
        })
        .mount(&server)
        .await;

    let client = impatient_client();
    let config = BatchConfig::new(server.uri()).with_concurrency(1);
    let err = BatchResolver::new(&client, &config)
        .resolve(&ids(250))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 250 }));
    assert_eq!(err.kind(), FailureKind::Transport);
    // the third batch is never requested
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(targets(&requests[1])[0], "id-100");
}

#[tokio::test]
async fn test_auth_failure_is_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri());
    let err = BatchResolver::new(&client, &config)
        .resolve(&ids(3))
        .await
        .unwrap_err();

    assert!(err.is_auth());
    assert_eq!(err.kind(), FailureKind::Auth);
}

#[tokio::test]
async fn test_unparseable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri());
    let err = BatchResolver::new(&client, &config)
        .resolve(&ids(3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn test_concurrent_batches_keep_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(Echo {
            slow_first: Some(Duration::from_millis(200)),
            ..Echo::array()
        })
        .mount(&server)
        .await;

    let client = client();
    let config = BatchConfig::new(server.uri())
        .with_capacity(10)
        .with_concurrency(3);
    let records = BatchResolver::new(&client, &config)
        .resolve(&ids(30))
        .await
        .unwrap();

    assert_eq!(record_ids(&records), ids(30));
}
