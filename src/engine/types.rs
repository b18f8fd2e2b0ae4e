//! Engine types
//!
//! Statistics and the report returned by one harvest run.

use crate::flatten::FlatDataset;
use crate::pagination::{AcceptedStrategy, Completeness};

/// Statistics from a harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Search requests issued while probing
    pub search_requests: usize,
    /// Unique identifiers discovered
    pub ids_discovered: usize,
    /// Batch-fetch requests issued
    pub batches: usize,
    /// Records returned by the batch endpoint
    pub records_resolved: usize,
    /// Columns in the flattened dataset
    pub columns: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl HarvestStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers for which no record came back
    pub fn unresolved(&self) -> usize {
        self.ids_discovered.saturating_sub(self.records_resolved)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Outcome of a complete harvest
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Flattened records
    pub dataset: FlatDataset,
    /// Whether every matching record was discovered
    pub completeness: Completeness,
    /// How the identifiers were discovered
    pub strategy: AcceptedStrategy,
    /// Run statistics
    pub stats: HarvestStats,
}

impl HarvestReport {
    /// Check if the harvest is known to be complete
    pub fn is_complete(&self) -> bool {
        self.completeness.is_complete()
    }
}
