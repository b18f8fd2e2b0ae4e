//! Shared vocabulary
//!
//! Aliases for identifiers and records plus the small enums that several
//! stages read from the job file.

use serde::{Deserialize, Serialize};

/// Any JSON value
pub type JsonValue = serde_json::Value;

/// A JSON object with insertion order preserved
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Stable external identifier of one record.
///
/// Compared by exact, case-sensitive string equality.
pub type CanonicalId = String;

/// One fully resolved record as returned by the batch-fetch endpoint
pub type RawRecord = JsonObject;

/// Where pagination parameters are placed on a search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    /// Merged into the JSON request body
    #[default]
    Body,
    /// Appended to the query string
    Query,
}

/// How the retry delay grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Same delay every time
    Constant,
    /// `initial * attempt`
    Linear,
    /// `initial * 2^attempt`
    #[default]
    Exponential,
}

/// Treat blank strings as absent
pub trait BlankAsNone {
    /// `None` when empty or whitespace only
    fn none_if_blank(self) -> Option<String>;
}

impl BlankAsNone for Option<String> {
    fn none_if_blank(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl BlankAsNone for String {
    fn none_if_blank(self) -> Option<String> {
        Some(self).none_if_blank()
    }
}
