//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML job → search probing → batch
//! resolution → flattening → CSV/Parquet/JSONL output

use recordharvest::config::{load_config, load_config_from_str};
use recordharvest::engine::Harvester;
use recordharvest::output::{write_dataset, OutputFormat, ParquetWriterConfig};
use recordharvest::pagination::{AcceptedStrategy, IncompleteReason, PaginationConvention};
use recordharvest::{Cell, Completeness, FailureKind};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn parquet() -> ParquetWriterConfig {
    ParquetWriterConfig::default()
}

// ============================================================================
// Fake endpoints
// ============================================================================

/// Search endpoint answering in the `hits.hits` shape, paging on the
/// `start` query parameter, with a duplicate at each page boundary
struct HitsSearch {
    total: usize,
}

impl Respond for HitsSearch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let limit = param("limit").unwrap_or(10);
        let start = param("start").unwrap_or(0);

        // Overlap by one so the boundary id shows up twice
        let from = start.saturating_sub(usize::from(start > 0));
        let end = (start + limit).min(self.total);
        let hits: Vec<Value> = (from..end.max(from))
            .map(|i| json!({"_source": {"ticketCanonicalId": format!("T-{i:03}")}}))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({"hits": {"total": self.total, "hits": hits}}))
    }
}

/// Batch endpoint answering with an id-keyed object
struct BatchEcho;

impl Respond for BatchEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let mut records = serde_json::Map::new();
        for target in body["targets"].as_array().unwrap() {
            let id = target.as_str().unwrap();
            let n: u64 = id.trim_start_matches("T-").parse().unwrap();
            let status = if n % 2 == 0 { "open" } else { "closed" };
            let mut record = json!({
                "canonicalId": id,
                "title": format!("Idea {n}"),
                "status": status,
                "owner": {"name": "sam", "teams": ["blue", "red"]},
                "tags": []
            });
            if n == 3 {
                record["extra"] = json!({"score": 9.5});
            }
            records.insert(id.to_string(), record);
        }
        ResponseTemplate::new(200).set_body_json(Value::Object(records))
    }
}

async fn start_servers(total: usize) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(HitsSearch { total })
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .respond_with(BatchEcho)
        .mount(&server)
        .await;
    server
}

fn job_yaml(server: &MockServer, pagination: &str) -> String {
    format!(
        r#"
name: ideas
search:
  url: {uri}/search
  param_location: query
  criteria:
    query: "*"
    order:
      field: createdDate
    where:
      - field: type.keyword
        match: [kickbox]
  pagination:
{pagination}
batch:
  url: {uri}/batch
  context: {{"tenant": "acme"}}
  capacity: 4
  concurrency: 2
auth:
  token: integration-token
http:
  max_retries: 0
  requests_per_second: 0
"#,
        uri = server.uri()
    )
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[tokio::test]
async fn test_harvest_to_csv() {
    let server = start_servers(12).await;
    let yaml = job_yaml(&server, "    probe_limit: 5\n    page_size: 5\n    safety_cap: 100");

    let dir = tempdir().unwrap();
    let job_path = dir.path().join("job.yaml");
    std::fs::File::create(&job_path)
        .unwrap()
        .write_all(yaml.as_bytes())
        .unwrap();

    let config = load_config(&job_path).unwrap();
    let harvester = Harvester::from_config(config, None).unwrap();
    let report = harvester.run().await.unwrap();

    // offset/from are ignored by the server, start is honoured
    assert_eq!(
        report.strategy,
        AcceptedStrategy::Convention(PaginationConvention::offset("start"))
    );
    assert_eq!(report.completeness, Completeness::Complete);
    assert_eq!(report.stats.ids_discovered, 12);
    assert_eq!(report.stats.batches, 3);
    assert_eq!(report.dataset.len(), 12);
    assert_eq!(
        report.dataset.columns(),
        [
            "canonicalId",
            "title",
            "status",
            "extra.score",
            "owner.name",
            "owner.teams",
            "tags"
        ]
    );
    assert_eq!(report.dataset.cell(0, "canonicalId"), Some(&Cell::from("T-000")));
    assert_eq!(report.dataset.cell(11, "canonicalId"), Some(&Cell::from("T-011")));
    assert_eq!(report.dataset.cell(3, "extra.score").unwrap().to_string(), "9.5");
    assert_eq!(report.dataset.cell(4, "extra.score"), Some(&Cell::Empty));

    let csv_path = dir.path().join("ideas.csv");
    let rows = write_dataset(&report.dataset, &csv_path, OutputFormat::Csv, &parquet()).unwrap();
    assert_eq!(rows, 12);

    let text = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 13);
    assert_eq!(
        lines[0],
        "canonicalId,title,status,extra.score,owner.name,owner.teams,tags"
    );
    assert_eq!(lines[1], "T-000,Idea 0,open,,sam,\"blue, red\",");
}

#[tokio::test]
async fn test_every_request_carries_credential_and_criteria() {
    let server = start_servers(3).await;
    let config = load_config_from_str(&job_yaml(&server, "    probe_limit: 5")).unwrap();

    Harvester::from_config(config, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(
            request.headers.get("authorization").unwrap(),
            "Bearer integration-token"
        );
    }

    let search: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        search,
        json!({
            "query": "*",
            "order": {"field": "createdDate", "direction": "DESC"},
            "where": [{"field": "type.keyword", "match": ["kickbox"], "matchMode": "EQUAL"}]
        })
    );
    assert_eq!(requests[0].url.query(), Some("limit=5"));

    let batch: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        batch,
        json!({"context": {"tenant": "acme"}, "targets": ["T-000", "T-001", "T-002"]})
    );
}

#[tokio::test]
async fn test_capped_harvest_to_parquet() {
    let server = start_servers(50).await;
    let config = load_config_from_str(&job_yaml(
        &server,
        "    probe_limit: 5\n    page_size: 5\n    safety_cap: 8",
    ))
    .unwrap();

    let report = Harvester::from_config(config, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        report.completeness,
        Completeness::Partial(IncompleteReason::SafetyCapReached)
    );
    assert_eq!(report.dataset.len(), 8);

    let dir = tempdir().unwrap();
    let out = dir.path().join("ideas.parquet");
    let format = OutputFormat::from_path(&out).unwrap();
    assert_eq!(write_dataset(&report.dataset, &out, format, &parquet()).unwrap(), 8);
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[tokio::test]
async fn test_rejected_credential_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let config = load_config_from_str(&job_yaml(&server, "    probe_limit: 5")).unwrap();

    let err = Harvester::from_config(config, None)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Auth);
    assert_eq!(err.kind().exit_code(), 3);
}

#[tokio::test]
async fn test_jsonl_output() {
    let server = start_servers(2).await;
    let config = load_config_from_str(&job_yaml(&server, "    probe_limit: 5")).unwrap();
    let report = Harvester::from_config(config, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("ideas.jsonl");
    write_dataset(&report.dataset, &out, OutputFormat::Jsonl, &parquet()).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let first: Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(first["canonicalId"], "T-000");
    assert_eq!(first["owner.teams"], "blue, red");
    assert_eq!(first["tags"], Value::Null);
}
