//! Identifier extraction
//!
//! Search deployments disagree on response shape and id field names, so
//! extraction tries each known shape in turn and never fails: a body it does
//! not recognize simply contains no identifiers.

use crate::types::{CanonicalId, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// Field names that may carry a record's identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdFields {
    /// Candidates on each element of a top-level result array
    pub record: Vec<String>,
    /// Candidates on each hit of a `hits.hits` container, looked up under
    /// `_source` first and then on the hit itself
    pub hit: Vec<String>,
}

impl Default for IdFields {
    fn default() -> Self {
        Self {
            record: vec![
                "ticketCanonicalId".to_string(),
                "canonicalId".to_string(),
                "id".to_string(),
            ],
            hit: vec!["ticketCanonicalId".to_string(), "canonicalId".to_string()],
        }
    }
}

/// A search response shape the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `[ {"ticketCanonicalId": "..."}, ... ]`
    FlatList,
    /// `{"hits": {"hits": [ {"_source": {"canonicalId": "..."}}, ... ]}}`
    NestedHits,
}

impl ResponseShape {
    /// Every shape, in the order they are tried
    pub const ALL: [ResponseShape; 2] = [ResponseShape::FlatList, ResponseShape::NestedHits];

    /// Extract identifiers if `body` has this shape.
    ///
    /// `None` means the shape did not match; `Some(vec![])` means it matched
    /// but held no usable identifiers.
    pub fn extract(self, body: &JsonValue, fields: &IdFields) -> Option<Vec<CanonicalId>> {
        match self {
            ResponseShape::FlatList => {
                let items = body.as_array()?;
                Some(
                    items
                        .iter()
                        .filter_map(JsonValue::as_object)
                        .filter_map(|item| first_id(item, &fields.record))
                        .collect(),
                )
            }
            ResponseShape::NestedHits => {
                let hits = body.get("hits")?.as_object()?.get("hits")?.as_array()?;
                Some(
                    hits.iter()
                        .filter_map(JsonValue::as_object)
                        .filter_map(|hit| {
                            hit.get("_source")
                                .and_then(JsonValue::as_object)
                                .and_then(|source| first_id(source, &fields.hit))
                                .or_else(|| first_id(hit, &fields.hit))
                        })
                        .collect(),
                )
            }
        }
    }
}

/// Extract the identifiers in one search response, in encounter order.
///
/// Unrecognized shapes yield an empty sequence.
pub fn extract_ids(body: &JsonValue, fields: &IdFields) -> Vec<CanonicalId> {
    ResponseShape::ALL
        .iter()
        .find_map(|shape| shape.extract(body, fields))
        .unwrap_or_default()
}

/// First candidate field holding a non-blank string
fn first_id(object: &JsonObject, candidates: &[String]) -> Option<CanonicalId> {
    candidates.iter().find_map(|name| {
        object
            .get(name)
            .and_then(JsonValue::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    })
}
