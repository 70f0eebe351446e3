//! CSV and SQL rendering of exported tables
//!
//! NULL handling is the part that matters for a clean import:
//!
//! | value             | CSV             | SQL          |
//! |-------------------|-----------------|--------------|
//! | null / empty text | empty, unquoted | `NULL`       |
//! | text              | `"a ""b"""`     | `'a ''b'''`  |
//! | number            | `"42"`          | `42`         |
//! | boolean           | `"true"`        | `TRUE`       |
//! | JSON              | `"{""k"":1}"`   | `'{"k":1}'`  |
//!
//! An empty unquoted CSV field is loaded as NULL by the destination's CSV
//! importer, while `""` would be loaded as an empty string and break UUID
//! and foreign-key columns.

use crate::domain::{CellValue, ExportedTable, FerryError};
use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

/// UTF-8 byte order mark written at the start of every CSV file
pub const UTF8_BOM: &str = "\u{feff}";

/// On-disk format of exported tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Sql,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Sql => "sql",
        }
    }

    /// Render a table; `schema` qualifies the SQL table name
    pub fn render(&self, table: &ExportedTable, schema: &str) -> String {
        match self {
            ExportFormat::Csv => to_csv(table),
            ExportFormat::Sql => to_sql(table, schema),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = FerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "sql" => Ok(ExportFormat::Sql),
            other => Err(FerryError::Configuration(format!(
                "Unknown export format '{other}'. Must be one of: csv, sql"
            ))),
        }
    }
}

/// Render a table as CSV with BOM and header row
pub fn to_csv(table: &ExportedTable) -> String {
    let columns = table.columns();
    let mut out = String::from(UTF8_BOM);

    let header: Vec<Cow<'_, str>> = columns.iter().map(|c| csv_header(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in &table.rows {
        let fields: Vec<String> = columns.iter().map(|c| csv_field(row.get(c))).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// One CSV field: empty for NULL-like values, quoted otherwise
pub fn csv_field(value: Option<&CellValue>) -> String {
    match value.and_then(CellValue::render) {
        None => String::new(),
        Some(text) => format!("\"{}\"", text.replace('"', "\"\"")),
    }
}

fn csv_header(name: &str) -> Cow<'_, str> {
    if name.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(name)
    }
}

/// Render a table as a block of `INSERT` statements
pub fn to_sql(table: &ExportedTable, schema: &str) -> String {
    let columns = table.columns();
    let mut out = String::new();

    let _ = writeln!(out, "-- Table: {}", table.name);
    let _ = writeln!(out, "-- Exported at: {}", table.exported_at.to_rfc3339());
    let _ = writeln!(out, "-- Rows: {}", table.row_count());
    out.push('\n');

    if columns.is_empty() {
        return out;
    }

    let target = format!(
        "{}.{}",
        quote_identifier(schema),
        quote_identifier(table.name.as_str())
    );
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    for row in &table.rows {
        let values = columns
            .iter()
            .map(|c| sql_literal(row.get(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "INSERT INTO {target} ({column_list}) VALUES ({values});");
    }

    out
}

/// One SQL literal: `NULL`, a bare number or boolean, or a quoted string
pub fn sql_literal(value: Option<&CellValue>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(v) if v.is_null_like() => "NULL".to_string(),
        Some(CellValue::Number(n)) => n.to_string(),
        Some(CellValue::Bool(true)) => "TRUE".to_string(),
        Some(CellValue::Bool(false)) => "FALSE".to_string(),
        Some(other) => match other.render() {
            Some(text) => format!("'{}'", text.replace('\'', "''")),
            None => "NULL".to_string(),
        },
    }
}

/// Quote an identifier unless it is a plain lowercase identifier
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}
