//! Batch resolver
//!
//! Batches are fetched through an ordered, bounded stream: results come back
//! in batch order whatever order the responses arrive in, and the first
//! failure drops the stream along with every pending batch.

use super::types::{BatchConfig, IdentifierBatch};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestOptions};
use crate::types::{CanonicalId, JsonValue, RawRecord};
use futures::{stream, StreamExt, TryStreamExt};
use std::collections::HashMap;
use tracing::{debug, info};

/// Resolves identifiers to full records
#[derive(Debug)]
pub struct BatchResolver<'a> {
    client: &'a HttpClient,
    config: &'a BatchConfig,
}

impl<'a> BatchResolver<'a> {
    /// Create a resolver
    pub fn new(client: &'a HttpClient, config: &'a BatchConfig) -> Self {
        Self { client, config }
    }

    /// Resolve every identifier, failing the whole run on the first bad batch
    pub async fn resolve(&self, ids: &[CanonicalId]) -> Result<Vec<RawRecord>> {
        let batches = IdentifierBatch::partition(ids, self.config.capacity);
        if batches.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            ids = ids.len(),
            batches = batches.len(),
            concurrency = self.config.concurrency,
            "resolving records"
        );

        let resolved: Vec<Vec<RawRecord>> = stream::iter(&batches)
            .map(|batch| self.fetch_batch(batch))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let records: Vec<RawRecord> = resolved.into_iter().flatten().collect();
        info!(records = records.len(), "records resolved");
        Ok(records)
    }

    /// Fetch one batch
    pub async fn fetch_batch(&self, batch: &IdentifierBatch) -> Result<Vec<RawRecord>> {
        let request = RequestOptions::new().json(batch.request_body(self.config.context.as_ref()));
        let body = self.client.post_json(&self.config.url, request).await?;
        let records = records_from_response(&self.config.url, body)?;

        debug!(
            batch = batch.index,
            requested = batch.len(),
            received = records.len(),
            "batch resolved"
        );
        Ok(order_by_request(records, &batch.ids, &self.config.id_fields))
    }
}

/// Records carried by a batch-fetch response.
///
/// An object contributes its object-valued entries, an array its object
/// elements. Any other shape is malformed.
pub fn records_from_response(url: &str, body: JsonValue) -> Result<Vec<RawRecord>> {
    match body {
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(_, value)| match value {
                JsonValue::Object(record) => Some(record),
                _ => None,
            })
            .collect()),
        JsonValue::Array(items) => Ok(items
            .into_iter()
            .filter_map(|value| match value {
                JsonValue::Object(record) => Some(record),
                _ => None,
            })
            .collect()),
        other => Err(Error::malformed(
            url,
            format!("expected an object or array of records, got {}", json_type(&other)),
        )),
    }
}

/// Put records in the order their identifiers were requested.
///
/// Records whose id fields match no requested id keep their response order
/// after the matched ones.
pub fn order_by_request(
    records: Vec<RawRecord>,
    requested: &[CanonicalId],
    id_fields: &[String],
) -> Vec<RawRecord> {
    let positions: HashMap<&str, usize> = requested
        .iter()
        .enumerate()
        .rev()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut matched = Vec::with_capacity(records.len());
    let mut unmatched = Vec::new();
    for record in records {
        let position = id_fields.iter().find_map(|field| {
            record
                .get(field)
                .and_then(JsonValue::as_str)
                .and_then(|id| positions.get(id).copied())
        });
        match position {
            Some(position) => matched.push((position, record)),
            None => unmatched.push(record),
        }
    }

    matched.sort_by_key(|(position, _)| *position);
    matched
        .into_iter()
        .map(|(_, record)| record)
        .chain(unmatched)
        .collect()
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
