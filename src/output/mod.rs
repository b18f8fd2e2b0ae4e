//! Output module
//!
//! Serializes a [`FlatDataset`](crate::flatten::FlatDataset) to disk.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Converting a flat dataset to an Arrow RecordBatch (all `Utf8` columns)
//! - Writing CSV and Parquet files from that batch
//! - Writing JSON Lines straight from the rows

mod schema;
mod writer;

pub use schema::{arrow_schema, dataset_to_record_batch};
pub use writer::{
    write_csv, write_dataset, write_jsonl, write_parquet, OutputFormat, ParquetCompression,
    ParquetWriterConfig,
};
