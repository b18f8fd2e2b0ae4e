//! # recordharvest
//!
//! Harvests a complete, deduplicated set of records from a search API whose
//! pagination contract is unknown, resolves the full records through a
//! batch-fetch API, and flattens them into one table.
//!
//! ## Features
//!
//! - **Adaptive pagination**: probes offset and page conventions until one
//!   extends the result, with a hard safety cap
//! - **Tolerant extraction**: flat result arrays and `hits.hits` containers
//! - **Batched resolution**: bounded, order-preserving concurrency
//! - **Stable flattening**: dotted column paths over a shared schema
//! - **Tabular output**: CSV, Parquet and JSON Lines
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recordharvest::{load_config, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> recordharvest::Result<()> {
//!     let config = load_config("job.yaml")?;
//!     let harvester = Harvester::from_config(config, None)?;
//!
//!     let report = harvester.run().await?;
//!     if !report.is_complete() {
//!         eprintln!("partial harvest: {:?}", report.completeness);
//!     }
//!     println!("{} rows", report.dataset.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! job.yaml ─► Harvester
//!               │
//!               ├─ probe      search endpoint ─► canonical ids (deduped, capped)
//!               ├─ resolve    batch endpoint  ─► raw records (request order)
//!               ├─ flatten    dotted columns  ─► FlatDataset
//!               └─ output     csv | parquet | jsonl
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::doc_markdown)]

// ---- pipeline stages, bottom-up ----

/// Error types and failure classification
pub mod error;

/// Identifier, record and JSON aliases shared by every stage
pub mod types;

/// Bearer credential handling
pub mod auth;

/// Throttled, retrying JSON client for both endpoints
pub mod http;

/// Search criteria, endpoint and identifier extraction
pub mod search;

/// Pagination convention discovery
pub mod pagination;

/// Order-preserving identifier deduplication
pub mod dedupe;

/// Batch resolution of identifiers to records
pub mod resolve;

/// Record flattening
pub mod flatten;

/// CSV, Parquet and JSON Lines output
pub mod output;

/// Harvest orchestration
pub mod engine;

/// Job file loading and validation
pub mod config;

/// `harvest`, `probe`, `validate` and `token` commands
pub mod cli;

// ---- re-exports ----

pub use error::{Error, FailureKind, Result};
pub use types::*;
pub use config::{load_config, load_config_from_str, HarvestConfig};
pub use engine::{HarvestReport, Harvester};
pub use flatten::{Cell, FlatDataset};
pub use pagination::Completeness;

/// Version reported by the CLI and the default user agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");
