//! Record flattener
//!
//! Rules, applied at every depth:
//!
//! - scalars map to a column of the same path
//! - nested objects recurse, joining keys with the separator
//! - lists of scalars join into one text cell (empty list → empty cell)
//! - lists holding objects or lists become compact JSON text
//! - a literal key that already contains the separator shares its column
//!   with the matching nested path; the value later in the record wins

use super::types::{Cell, ColumnSchema, FlatDataset, FlatRow, FlattenConfig};
use crate::types::{JsonValue, RawRecord};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Collects column names seen across records
#[derive(Debug, Default)]
pub struct ColumnSchemaBuilder {
    seen: BTreeSet<String>,
}

impl ColumnSchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column name
    pub fn observe(&mut self, column: &str) {
        if !self.seen.contains(column) {
            self.seen.insert(column.to_string());
        }
    }

    /// Preferred columns that were seen, in preference order, then the rest
    /// sorted
    pub fn build(self, preferred: &[String]) -> ColumnSchema {
        let mut rest = self.seen;
        let mut columns = Vec::with_capacity(rest.len());
        for column in preferred {
            if rest.remove(column) {
                columns.push(column.clone());
            }
        }
        columns.extend(rest);
        ColumnSchema::new(columns)
    }
}

/// Flattens raw records into a [`FlatDataset`]
#[derive(Debug, Clone, Default)]
pub struct Flattener {
    config: FlattenConfig,
}

impl Flattener {
    /// Create a flattener
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    /// Flattener settings
    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Flatten every record over one schema, keeping record order
    pub fn flatten(&self, records: &[RawRecord]) -> FlatDataset {
        let mut builder = ColumnSchemaBuilder::new();
        let flattened: Vec<HashMap<String, Cell>> = records
            .iter()
            .map(|record| {
                let flat = self.flatten_record(record);
                for column in flat.keys() {
                    builder.observe(column);
                }
                flat
            })
            .collect();

        let schema = builder.build(&self.config.preferred_columns);
        let rows: Vec<FlatRow> = flattened
            .into_iter()
            .map(|mut flat| {
                schema
                    .columns()
                    .iter()
                    .map(|column| flat.remove(column).unwrap_or_default())
                    .collect()
            })
            .collect();

        debug!(rows = rows.len(), columns = schema.len(), "records flattened");
        FlatDataset::new(schema, rows)
    }

    /// Flatten one record into column → cell
    pub fn flatten_record(&self, record: &RawRecord) -> HashMap<String, Cell> {
        let mut out = HashMap::new();
        for (key, value) in record {
            self.flatten_value(key.clone(), value, &mut out);
        }
        out
    }

    fn flatten_value(&self, path: String, value: &JsonValue, out: &mut HashMap<String, Cell>) {
        match value {
            JsonValue::Object(map) => {
                for (key, nested) in map {
                    let child = format!("{path}{}{key}", self.config.separator);
                    self.flatten_value(child, nested, out);
                }
            }
            JsonValue::Array(items) => put(out, path, self.list_cell(items)),
            scalar => put(out, path, scalar_cell(scalar)),
        }
    }

    fn list_cell(&self, items: &[JsonValue]) -> Cell {
        if items.is_empty() {
            return Cell::Empty;
        }
        if items.iter().any(|v| v.is_array() || v.is_object()) {
            let text = serde_json::to_string(items).unwrap_or_default();
            return Cell::Text(text);
        }
        let joined = items
            .iter()
            .map(|v| scalar_cell(v).to_string())
            .collect::<Vec<_>>()
            .join(&self.config.list_delimiter);
        Cell::Text(joined)
    }
}

fn put(out: &mut HashMap<String, Cell>, path: String, cell: Cell) {
    match out.entry(path) {
        Entry::Occupied(mut slot) => {
            debug!(
                column = %slot.key(),
                dropped = %slot.get(),
                "column written twice in one record, keeping the later value"
            );
            slot.insert(cell);
        }
        Entry::Vacant(slot) => {
            slot.insert(cell);
        }
    }
}

fn scalar_cell(value: &JsonValue) -> Cell {
    match value {
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Number(n) => Cell::Number(n.clone()),
        JsonValue::String(s) => Cell::Text(s.clone()),
        _ => Cell::Empty,
    }
}
