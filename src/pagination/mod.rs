//! Pagination module
//!
//! Discovers how an undocumented search endpoint pages its results.
//!
//! # Overview
//!
//! A single probe request decides whether paging is needed at all. When the
//! probe fills its limit, the [`Prober`] tries each [`PaginationConvention`]
//! in turn, accepts the first one that yields new identifiers, and falls back
//! to one larger request before settling for the probe's own identifiers.
//! Every result carries a [`Completeness`] flag so callers can tell a full
//! harvest from a best-effort one.

mod conventions;
mod prober;
mod types;

pub use conventions::PaginationConvention;
pub use prober::Prober;
pub use types::{AcceptedStrategy, Completeness, IncompleteReason, ProbeConfig, ProbeOutcome};
