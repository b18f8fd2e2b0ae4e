//! Flattening types

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One value of a flattened row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cell {
    /// No value: missing key, JSON null or an empty scalar list
    #[default]
    Empty,
    /// Boolean
    Bool(bool),
    /// Number, kept exactly as received
    Number(serde_json::Number),
    /// Text, including joined lists and JSON-encoded nested lists
    Text(String),
}

impl Cell {
    /// Check if the cell holds no value
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Text content, if the cell is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back to a JSON value (`Empty` becomes null)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Empty => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => JsonValue::Number(n.clone()),
            Self::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered, duplicate-free column names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema from names already in final order; repeats are dropped
    pub fn new(columns: impl IntoIterator<Item = String>) -> Self {
        let mut schema = Self::default();
        for column in columns {
            if !schema.positions.contains_key(&column) {
                schema.positions.insert(column.clone(), schema.columns.len());
                schema.columns.push(column);
            }
        }
        schema
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One cell per schema column, in schema order
pub type FlatRow = Vec<Cell>;

/// Flattened records over a shared schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatDataset {
    schema: ColumnSchema,
    rows: Vec<FlatRow>,
}

impl FlatDataset {
    /// Create a dataset; rows must already match the schema width
    pub(crate) fn new(schema: ColumnSchema, rows: Vec<FlatRow>) -> Self {
        Self { schema, rows }
    }

    /// Column schema
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    /// Rows in resolution order
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` in the named column
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let position = self.schema.position(column)?;
        self.rows.get(row).and_then(|cells| cells.get(position))
    }
}

/// Settings for the flattener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Joins nested key paths
    pub separator: String,
    /// Joins scalar list elements
    pub list_delimiter: String,
    /// Columns placed first, in this order, when present
    pub preferred_columns: Vec<String>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
            list_delimiter: ", ".to_string(),
            preferred_columns: [
                "id",
                "canonicalId",
                "title",
                "status",
                "type",
                "createdDate",
                "creator",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}
