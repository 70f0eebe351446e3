//! Reading exported tables back into string rows
//!
//! Accepts the zip archive written by the table export, or loose `.csv` and
//! `.sql` files. Every value comes back as a string; NULL becomes `""`.

use crate::core::export::UTF8_BOM;
use crate::domain::{FerryError, Result};
use serde::Serialize;
use sqlparser::ast::{Expr, SetExpr, Statement, UnaryOperator, Value};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// One row, keyed by column name
pub type Row = HashMap<String, String>;

/// A parsed table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    /// Columns in first-seen order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedTable {
    /// Append another file's rows for the same table
    fn merge(&mut self, other: ParsedTable) {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }
}

/// A table file that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub message: String,
}

/// All tables loaded for one validation run
///
/// A table file that fails to parse is recorded in [`file_errors`] and the
/// remaining files still load.
///
/// [`file_errors`]: ValidationInput::file_errors
#[derive(Debug, Clone, Default)]
pub struct ValidationInput {
    tables: BTreeMap<String, ParsedTable>,
    file_errors: Vec<FileError>,
}

impl ValidationInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every path; zip archives are expanded
    ///
    /// Table files that fail to parse are recorded and skipped. A path that
    /// cannot be opened at all is an error.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut input = Self::new();
        for path in paths {
            input.add_path(path.as_ref())?;
        }
        Ok(input)
    }

    /// Load a zip archive, `.csv` file or `.sql` file
    pub fn add_path(&mut self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        if extension.as_deref() == Some("zip") {
            let file = File::open(path)
                .map_err(|e| FerryError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
            return self.add_archive(file);
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FerryError::Parse(format!("Invalid file name: {}", path.display())))?;

        let Some(table) = table_name_from_file(file_name) else {
            tracing::debug!(path = %path.display(), "Skipping non-table file");
            return Ok(());
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => self.load_document(&table, file_name, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                self.record_file_error(file_name, e.to_string());
                Ok(())
            }
            Err(e) => Err(FerryError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Load every table file inside a zip archive
    pub fn add_archive<R: Read + Seek>(&mut self, reader: R) -> Result<()> {
        let mut archive = ZipArchive::new(reader)?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let entry_name = entry.name().to_string();
            let file_name = entry_name.rsplit('/').next().unwrap_or(&entry_name);
            let Some(table) = table_name_from_file(file_name) else {
                continue;
            };

            let mut contents = String::new();
            match entry.read_to_string(&mut contents) {
                Ok(_) => self.load_document(&table, &entry_name, &contents)?,
                Err(e) => self.record_file_error(&entry_name, e.to_string()),
            }
        }
        Ok(())
    }

    /// Parse one file's text; the parser is chosen by extension
    ///
    /// Parse failures are returned with the file name prefixed.
    pub fn add_document(&mut self, table: &str, file_name: &str, contents: &str) -> Result<()> {
        let parsed = parse_document(file_name, contents).map_err(|e| match e {
            FerryError::Parse(message) => FerryError::Parse(format!("{file_name}: {message}")),
            other => other,
        })?;
        self.insert_parsed(table, parsed);
        Ok(())
    }

    /// Like [`add_document`](Self::add_document), but a parse failure is
    /// recorded as a file error instead of returned
    pub fn load_document(&mut self, table: &str, file_name: &str, contents: &str) -> Result<()> {
        match parse_document(file_name, contents) {
            Ok(parsed) => self.insert_parsed(table, parsed),
            Err(FerryError::Parse(message)) => self.record_file_error(file_name, message),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn insert_parsed(&mut self, table: &str, parsed: ParsedTable) {
        tracing::debug!(table, rows = parsed.rows.len(), "Loaded table for validation");
        self.insert(table, parsed);
    }

    fn record_file_error(&mut self, file: &str, message: String) {
        tracing::warn!(file, error = %message, "Skipping unreadable table file");
        self.file_errors.push(FileError {
            file: file.to_string(),
            message,
        });
    }

    /// Files that could not be parsed, in load order
    pub fn file_errors(&self) -> &[FileError] {
        &self.file_errors
    }

    pub fn insert(&mut self, table: &str, parsed: ParsedTable) {
        match self.tables.get_mut(table) {
            Some(existing) => existing.merge(parsed),
            None => {
                self.tables.insert(table.to_string(), parsed);
            }
        }
    }

    pub fn get(&self, table: &str) -> Option<&ParsedTable> {
        self.tables.get(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Tables in name order
    pub fn tables(&self) -> impl Iterator<Item = (&str, &ParsedTable)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn parse_document(file_name: &str, contents: &str) -> Result<ParsedTable> {
    if file_name.to_ascii_lowercase().ends_with(".sql") {
        parse_sql(contents)
    } else {
        parse_csv(contents)
    }
}

/// Table name for an exported file name, or `None` for non-table files
///
/// `07_patients.csv` → `patients`. Files starting with `_` and `README.txt`
/// are manifests.
pub fn table_name_from_file(file_name: &str) -> Option<String> {
    if file_name.starts_with('_') || file_name.eq_ignore_ascii_case("README.txt") {
        return None;
    }

    let (stem, extension) = file_name.rsplit_once('.')?;
    if !matches!(extension.to_ascii_lowercase().as_str(), "csv" | "sql") {
        return None;
    }

    let name = match stem.split_once('_') {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => stem,
    };

    (!name.is_empty()).then(|| name.to_string())
}

/// Parse CSV text with a header row
///
/// Quoted fields may contain commas, doubled quotes and line breaks. A
/// leading BOM is ignored. Short records are padded with `""`.
pub fn parse_csv(text: &str) -> Result<ParsedTable> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut records = csv_records(text)?.into_iter();

    let Some(columns) = records.next() else {
        return Ok(ParsedTable::default());
    };

    // A blank line is a NULL row when there is one column
    let single_column = columns.len() == 1;
    let rows: Vec<Row> = records
        .filter(|record| single_column || !(record.len() == 1 && record[0].is_empty()))
        .map(|record| {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), record.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect();

    Ok(ParsedTable { columns, rows })
}

fn csv_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(FerryError::Parse("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Parse the `INSERT INTO t (cols) VALUES (...), (...);` statements of a dump
///
/// Other statements and `--` comments are ignored. `NULL` becomes `""` and
/// booleans become `true` / `false`.
pub fn parse_sql(text: &str) -> Result<ParsedTable> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, text)?;
    let mut table = ParsedTable::default();

    for statement in statements {
        let Statement::Insert(insert) = statement else {
            continue;
        };
        let columns: Vec<String> = insert.columns.into_iter().map(|c| c.value).collect();
        for column in &columns {
            if !table.columns.contains(column) {
                table.columns.push(column.clone());
            }
        }

        let Some(source) = insert.source else {
            continue;
        };
        let SetExpr::Values(values) = *source.body else {
            return Err(FerryError::Parse(format!(
                "INSERT INTO {} must use a VALUES list",
                insert.table_name
            )));
        };

        for tuple in values.rows {
            if tuple.len() != columns.len() {
                return Err(FerryError::Parse(format!(
                    "INSERT INTO {} has {} columns but {} values",
                    insert.table_name,
                    columns.len(),
                    tuple.len()
                )));
            }
            let row = columns.iter().cloned().zip(tuple.iter().map(sql_cell)).collect();
            table.rows.push(row);
        }
    }

    Ok(table)
}

fn sql_cell(expr: &Expr) -> String {
    match expr {
        Expr::Value(Value::Null) => String::new(),
        Expr::Value(Value::Boolean(b)) => b.to_string(),
        Expr::Value(Value::Number(n, _)) => n.to_string(),
        Expr::Value(
            Value::SingleQuotedString(s)
            | Value::DoubleQuotedString(s)
            | Value::EscapedStringLiteral(s),
        ) => s.clone(),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => format!("-{}", sql_cell(expr)),
        other => other.to_string(),
    }
}
