//! Exported row and table models
//!
//! Rows arrive from the row API as JSON objects and are kept in a typed form
//! ([`CellValue`]) until they are rendered as CSV or SQL.

use super::ids::TableName;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A single column value of an exported row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// SQL NULL
    Null,
    /// Text value
    Text(String),
    /// Numeric value, kept in its original JSON representation
    Number(Number),
    /// Boolean value
    Bool(bool),
    /// Structured value (JSON/JSONB column, arrays)
    Json(Value),
}

impl CellValue {
    /// Whether this value must be written as NULL
    ///
    /// Empty strings are treated as NULL: a quoted empty string is not NULL
    /// to the destination database and breaks UUID and foreign-key columns.
    pub fn is_null_like(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Textual form of the value, or `None` for NULL-like values
    ///
    /// Structured values are flattened to their JSON text.
    pub fn render(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Json(v) => Some(v.to_string()),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::String(s) => CellValue::Text(s),
            Value::Number(n) => CellValue::Number(n),
            Value::Bool(b) => CellValue::Bool(b),
            other => CellValue::Json(other),
        }
    }
}

/// One exported record: column name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportedRow {
    cells: BTreeMap<String, CellValue>,
}

impl ExportedRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from a JSON object returned by the row API
    pub fn from_json(object: Map<String, Value>) -> Self {
        Self {
            cells: object
                .into_iter()
                .map(|(column, value)| (column, CellValue::from(value)))
                .collect(),
        }
    }

    /// Set a column value (builder style, mostly for tests and fixtures)
    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.cells.insert(column.into(), value);
        self
    }

    /// Get a column value
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Column names present in this row
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

/// All rows of one table, as produced by a single export run
#[derive(Debug, Clone, Serialize)]
pub struct ExportedTable {
    /// Table name
    pub name: TableName,

    /// Rows in fetch order
    pub rows: Vec<ExportedRow>,

    /// When the export of this table finished
    pub exported_at: DateTime<Utc>,
}

impl ExportedTable {
    /// Create a new exported table
    pub fn new(name: TableName, rows: Vec<ExportedRow>) -> Self {
        Self {
            name,
            rows,
            exported_at: Utc::now(),
        }
    }

    /// Number of exported rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Sorted union of the column names across all rows
    ///
    /// Rows returned by the API may omit keys, so no single row is trusted
    /// to carry the full header.
    pub fn columns(&self) -> Vec<String> {
        let columns: BTreeSet<&str> = self.rows.iter().flat_map(ExportedRow::columns).collect();
        columns.into_iter().map(str::to_string).collect()
    }
}
