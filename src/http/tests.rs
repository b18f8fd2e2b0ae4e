//! Tests for the HTTP client module

use super::*;
use crate::auth::BearerToken;
use crate::error::{Error, FailureKind};
use crate::types::BackoffType;
use serde_json::json;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client with fast constant backoff and no throttling
fn client(retries: u32) -> HttpClient {
    let config = HttpClientConfig::builder()
        .max_retries(retries)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(50),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn url(server: &MockServer, route: &str) -> String {
    format!("{}{route}", server.uri())
}

async fn respond(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_defaults_match_harvest_settings() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry, RetryPolicy::default());
    assert_eq!(config.retry.max_retries, 2);
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(5, 5)));
    assert!(config.user_agent.starts_with("recordharvest/"));
}

#[test]
fn test_builder_sets_every_field() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(5))
        .max_retries(4)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(50),
            Duration::from_secs(2),
        )
        .header("X-Tenant", "acme")
        .user_agent("harvest-test")
        .no_rate_limit()
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(
        config.retry,
        RetryPolicy {
            max_retries: 4,
            backoff: BackoffType::Linear,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    );
    assert_eq!(config.default_headers["X-Tenant"], "acme");
    assert_eq!(config.user_agent, "harvest-test");
    assert!(config.rate_limit.is_none());
}

#[test_case(BackoffType::Constant, [100, 100, 100, 100] ; "constant")]
#[test_case(BackoffType::Linear, [100, 200, 300, 400] ; "linear")]
#[test_case(BackoffType::Exponential, [100, 200, 400, 450] ; "exponential capped")]
fn test_backoff_curve(kind: BackoffType, expected_ms: [u64; 4]) {
    let policy = RetryPolicy {
        max_retries: 4,
        backoff: kind,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(450),
    };

    let delays: Vec<u64> = (0..4)
        .map(|attempt| policy.delay(attempt).as_millis() as u64)
        .collect();
    assert_eq!(delays, expected_ms);
}

#[test]
fn test_backoff_saturates() {
    let policy = RetryPolicy {
        max_delay: Duration::MAX,
        ..RetryPolicy::default()
    };
    assert!(policy.delay(u32::MAX) >= policy.delay(40));
}

#[test]
fn test_debug_output_never_shows_token() {
    let mut client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
    client.set_token(BearerToken::new("s3cr3t-value").unwrap());

    let rendered = format!("{client:?}");
    assert!(rendered.contains("has_token: true"));
    assert!(rendered.contains("throttled: true"));
    assert!(!rendered.contains("s3cr3t-value"));
    assert_eq!(client.token().map(BearerToken::secret), Some("s3cr3t-value"));
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_post_json_sends_body_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"query": "*", "limit": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "r-1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(0)
        .post_json(
            &url(&server, "/search"),
            RequestOptions::new().json(json!({"query": "*", "limit": 10})),
        )
        .await
        .unwrap();

    assert_eq!(body, json!([{"id": "r-1"}]));
}

#[tokio::test]
async fn test_token_query_and_default_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("Authorization", "Bearer tok-9"))
        .and(header("X-Tenant", "acme"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .header("X-Tenant", "acme")
        .no_rate_limit()
        .build();
    let mut client = HttpClient::with_config(config).unwrap();
    client.set_token(BearerToken::new("tok-9").unwrap());

    let body = client
        .post_json(&url(&server, "/search"), RequestOptions::new().query("page", "2"))
        .await
        .unwrap();
    assert_eq!(body, json!([]));
}

// ============================================================================
// Failure classification
// ============================================================================

#[tokio::test]
async fn test_unauthorized_fails_once_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(3)
        .post_json(&url(&server, "/search"), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthorized { status: 401, .. }));
    assert_eq!(err.kind(), FailureKind::Auth);
}

#[tokio::test]
async fn test_client_error_keeps_body_excerpt() {
    let server = MockServer::start().await;
    respond(&server, "/short", ResponseTemplate::new(404).set_body_string("no such index")).await;
    respond(&server, "/long", ResponseTemplate::new(400).set_body_string("e".repeat(1200))).await;

    let client = client(2);

    let short = client
        .post_json(&url(&server, "/short"), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(&short, Error::HttpStatus { status: 404, body } if body == "no such index"));
    assert_eq!(short.kind(), FailureKind::UnexpectedStatus);

    match client
        .post_json(&url(&server, "/long"), RequestOptions::new())
        .await
        .unwrap_err()
    {
        Error::HttpStatus { status: 400, body } => assert_eq!(body.chars().count(), 300),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_non_json_reply_is_malformed() {
    let server = MockServer::start().await;
    respond(&server, "/search", ResponseTemplate::new(200).set_body_string("<html/>")).await;

    let err = client(0)
        .post_json(&url(&server, "/search"), RequestOptions::new().json(json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn test_transient_errors_recover() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    respond(&server, "/flaky", ResponseTemplate::new(200).set_body_json(json!({"ok": true}))).await;

    let body = client(2)
        .post_json(&url(&server, "/flaky"), RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_retries_stop_after_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(2)
        .post_json(&url(&server, "/search"), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_long_retry_after_is_capped_by_max_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3600"))
        .expect(2)
        .mount(&server)
        .await;

    // one retry; the hour-long wait must shrink to the 50ms ceiling
    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        client(1).post_json(&url(&server, "/search"), RequestOptions::new()),
    )
    .await
    .expect("client honoured the full Retry-After");

    let err = outcome.unwrap_err();
    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: Some(3600)
        }
    ));
    assert_eq!(err.kind(), FailureKind::UnexpectedStatus);
}

#[tokio::test]
async fn test_throttled_without_retry_after_uses_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    respond(&server, "/search", ResponseTemplate::new(200).set_body_json(json!([]))).await;

    let body = tokio::time::timeout(
        Duration::from_secs(2),
        client(1).post_json(&url(&server, "/search"), RequestOptions::new()),
    )
    .await
    .expect("missing Retry-After fell back to a long fixed wait")
    .unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_slow_reply_times_out() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/slow",
        ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
    )
    .await;

    let config = HttpClientConfig::builder()
        .timeout(Duration::from_millis(40))
        .max_retries(0)
        .no_rate_limit()
        .build();
    let err = HttpClient::with_config(config)
        .unwrap()
        .post_json(&url(&server, "/slow"), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 40 }));
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_throttled_client_still_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(4)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .rate_limit(RateLimiterConfig::new(50, 2))
        .build();
    let client = HttpClient::with_config(config).unwrap();

    for _ in 0..4 {
        client
            .post_json(&url(&server, "/search"), RequestOptions::new())
            .await
            .unwrap();
    }
}
