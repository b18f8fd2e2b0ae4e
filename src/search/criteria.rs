//! Search criteria
//!
//! The filter description sent to the search endpoint. It is fixed for the
//! whole run; pagination parameters are layered on top of the rendered body.

use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

/// Ordering of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    /// Field to sort on
    pub field: String,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
}

/// How a predicate's values are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMode {
    /// Field equals one of the values
    #[default]
    Equal,
    /// Field equals none of the values
    NotEqual,
    /// Field lies between the two values (inclusive)
    Between,
    /// Field contains the value
    Contains,
}

/// One field predicate of the `where` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPredicate {
    /// Field name (e.g. `type.keyword`)
    pub field: String,
    /// Values to match against
    #[serde(rename = "match")]
    pub values: Vec<JsonValue>,
    /// Match mode
    #[serde(default, rename = "matchMode", alias = "match_mode")]
    pub match_mode: MatchMode,
}

impl FieldPredicate {
    /// Create an equality predicate
    pub fn equal(field: impl Into<String>, values: Vec<JsonValue>) -> Self {
        Self {
            field: field.into(),
            values,
            match_mode: MatchMode::Equal,
        }
    }

    fn to_json(&self) -> JsonValue {
        json!({
            "field": self.field,
            "match": self.values,
            "matchMode": self.match_mode,
        })
    }
}

/// Inclusive date range on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Timestamp field to filter on
    pub field: String,
    /// Range start
    pub from: DateTime<Utc>,
    /// Range end
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Render as a `BETWEEN` predicate with millisecond UTC timestamps
    fn to_predicate(&self) -> FieldPredicate {
        FieldPredicate {
            field: self.field.clone(),
            values: vec![
                JsonValue::String(self.from.to_rfc3339_opts(SecondsFormat::Millis, true)),
                JsonValue::String(self.to.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ],
            match_mode: MatchMode::Between,
        }
    }
}

/// Filter description for one harvesting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Free-text query
    #[serde(default = "default_query")]
    pub query: String,
    /// Result ordering
    #[serde(default)]
    pub order: Option<SortOrder>,
    /// Field predicates
    #[serde(default, rename = "where")]
    pub predicates: Vec<FieldPredicate>,
    /// Optional date range, sent as an extra `BETWEEN` predicate
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

fn default_query() -> String {
    "*".to_string()
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            query: default_query(),
            order: None,
            predicates: Vec::new(),
            date_range: None,
        }
    }
}

impl SearchCriteria {
    /// Create criteria with a free-text query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the ordering
    #[must_use]
    pub fn with_order(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some(SortOrder {
            field: field.into(),
            direction,
        });
        self
    }

    /// Add a predicate
    #[must_use]
    pub fn with_predicate(mut self, predicate: FieldPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Set the date range
    #[must_use]
    pub fn with_date_range(
        mut self,
        field: impl Into<String>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Self {
        self.date_range = Some(DateRange {
            field: field.into(),
            from,
            to,
        });
        self
    }

    /// Render the JSON request body, without any size or page parameters
    pub fn to_request_body(&self) -> JsonObject {
        let mut predicates: Vec<JsonValue> =
            self.predicates.iter().map(FieldPredicate::to_json).collect();
        if let Some(range) = &self.date_range {
            predicates.push(range.to_predicate().to_json());
        }

        let mut body = JsonObject::new();
        body.insert("query".to_string(), JsonValue::String(self.query.clone()));
        if let Some(order) = &self.order {
            body.insert(
                "order".to_string(),
                json!({ "field": order.field, "direction": order.direction }),
            );
        }
        body.insert("where".to_string(), JsonValue::Array(predicates));
        body
    }
}
