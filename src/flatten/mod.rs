//! Record flattening module
//!
//! Converts heterogeneous nested records into rows over one shared column
//! schema. Flattening is two-pass: every record is flattened while a
//! [`ColumnSchemaBuilder`] observes its keys, then rows are materialized
//! against the finished [`ColumnSchema`] with missing cells left
//! [`Cell::Empty`].

mod flattener;
mod types;

pub use flattener::{ColumnSchemaBuilder, Flattener};
pub use types::{Cell, ColumnSchema, FlatDataset, FlatRow, FlattenConfig};
