//! Batch resolution types

use crate::types::{CanonicalId, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// Settings for the batch-fetch endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Batch-fetch endpoint URL
    pub url: String,
    /// Opaque context value sent with every batch
    pub context: Option<JsonValue>,
    /// Maximum identifiers per batch
    pub capacity: usize,
    /// Batches in flight at once
    pub concurrency: usize,
    /// Record fields matched against requested identifiers, in priority order
    pub id_fields: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            context: None,
            capacity: 100,
            concurrency: 2,
            id_fields: vec![
                "canonicalId".to_string(),
                "ticketCanonicalId".to_string(),
                "id".to_string(),
            ],
        }
    }
}

impl BatchConfig {
    /// Create a config for the given endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the context value
    #[must_use]
    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the batch capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of concurrent batches
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// An ordered group of identifiers resolved by one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierBatch {
    /// Position of the batch in the run
    pub index: usize,
    /// Identifiers, in working-set order
    pub ids: Vec<CanonicalId>,
}

impl IdentifierBatch {
    /// Split identifiers into consecutive batches of at most `capacity`
    pub fn partition(ids: &[CanonicalId], capacity: usize) -> Vec<Self> {
        ids.chunks(capacity.max(1))
            .enumerate()
            .map(|(index, chunk)| Self {
                index,
                ids: chunk.to_vec(),
            })
            .collect()
    }

    /// Number of identifiers in the batch
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Request body: `{"context": ..., "targets": [...]}`, context omitted when unset
    pub fn request_body(&self, context: Option<&JsonValue>) -> JsonValue {
        let mut body = JsonObject::new();
        if let Some(context) = context {
            body.insert("context".to_string(), context.clone());
        }
        body.insert(
            "targets".to_string(),
            JsonValue::Array(self.ids.iter().cloned().map(JsonValue::String).collect()),
        );
        JsonValue::Object(body)
    }
}
