//! Flat dataset to Arrow conversion
//!
//! Every column is a nullable `Utf8` field; empty cells become nulls and all
//! other cells use their display text.

use crate::error::Result;
use crate::flatten::FlatDataset;
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// Arrow schema for a dataset's columns
pub fn arrow_schema(dataset: &FlatDataset) -> Schema {
    let fields: Vec<Field> = dataset
        .columns()
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    Schema::new(fields)
}

/// Convert a dataset to one RecordBatch
pub fn dataset_to_record_batch(dataset: &FlatDataset) -> Result<RecordBatch> {
    let schema = Arc::new(arrow_schema(dataset));

    let columns: Vec<ArrayRef> = (0..dataset.schema().len())
        .map(|position| {
            let values: Vec<Option<String>> = dataset
                .rows()
                .iter()
                .map(|row| {
                    row.get(position)
                        .filter(|cell| !cell.is_empty())
                        .map(ToString::to_string)
                })
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    // Row count is explicit so a dataset without columns still converts
    let options = RecordBatchOptions::new().with_row_count(Some(dataset.len()));
    let batch = RecordBatch::try_new_with_options(schema, columns, &options)?;
    Ok(batch)
}
