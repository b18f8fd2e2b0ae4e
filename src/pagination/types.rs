//! Pagination types
//!
//! Configuration and results of one probing run.

use super::conventions::PaginationConvention;
use crate::types::CanonicalId;
use serde::{Deserialize, Serialize};

/// Settings for the pagination prober
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Size of the first, exploratory request
    pub probe_limit: usize,
    /// Page size for follow-up pagination
    pub page_size: usize,
    /// Hard cap on identifiers collected
    pub safety_cap: usize,
    /// Ceiling of the single larger request tried after every convention
    /// failed (bounded by `safety_cap`)
    pub last_resort_limit: usize,
    /// Name of the result-size parameter
    pub limit_param: String,
    /// Conventions to try, in order
    pub conventions: Vec<PaginationConvention>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_limit: 2000,
            page_size: 1000,
            safety_cap: 20_000,
            last_resort_limit: 5000,
            limit_param: "limit".to_string(),
            conventions: PaginationConvention::defaults(),
        }
    }
}

impl ProbeConfig {
    /// Create a config with the given probe limit, page size and cap
    pub fn new(probe_limit: usize, page_size: usize, safety_cap: usize) -> Self {
        Self {
            probe_limit,
            page_size,
            safety_cap,
            ..Default::default()
        }
    }

    /// Set the last-resort ceiling
    #[must_use]
    pub fn with_last_resort_limit(mut self, limit: usize) -> Self {
        self.last_resort_limit = limit;
        self
    }

    /// Replace the convention list
    #[must_use]
    pub fn with_conventions(mut self, conventions: Vec<PaginationConvention>) -> Self {
        self.conventions = conventions;
        self
    }
}

/// Why a harvest may be missing records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteReason {
    /// The safety cap stopped collection while more pages may exist
    SafetyCapReached,
    /// No convention or fallback extended the first probe
    ConventionsExhausted,
    /// A convention extended the result, then a later page failed
    PaginationInterrupted,
}

impl std::fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IncompleteReason::SafetyCapReached => "safety cap reached",
            IncompleteReason::ConventionsExhausted => "no pagination convention extended the probe",
            IncompleteReason::PaginationInterrupted => "pagination stopped on a failed page",
        };
        f.write_str(text)
    }
}

/// Whether the identifier set is known to be complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Every matching record was discovered
    Complete,
    /// Best-effort result that may be missing records
    Partial(IncompleteReason),
}

impl Completeness {
    /// Check if the result is complete
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// How the final identifier set was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedStrategy {
    /// The first probe returned fewer ids than its limit
    SingleRequest,
    /// A pagination convention extended the probe
    Convention(PaginationConvention),
    /// The larger fallback request extended the probe
    LastResort {
        /// Limit used for the fallback request
        limit: usize,
    },
    /// Nothing extended the probe; its ids are returned as they are
    ProbeOnly,
}

/// Result of one probing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Deduplicated identifiers in first-seen order
    pub ids: Vec<CanonicalId>,
    /// Strategy that produced `ids`
    pub strategy: AcceptedStrategy,
    /// Completeness flag
    pub completeness: Completeness,
    /// Number of search requests issued
    pub requests: usize,
}
