//! Archive assembly for table exports
//!
//! Data files are named `NN_table.ext`, where `NN` is the table's import
//! order zero-padded to the registry's width, so an alphabetical listing of
//! the archive is the import order. Two text files accompany them:
//! `_IMPORT_ORDER.txt` and `README.txt`.

use super::serialize::ExportFormat;
use super::summary::{TableExportOutcome, TableStatus};
use crate::core::registry::{SchemaRegistry, TableDefinition};
use crate::domain::{FerryError, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the import-order manifest inside the archive
pub const IMPORT_ORDER_FILE: &str = "_IMPORT_ORDER.txt";

/// Name of the README inside the archive
pub const README_FILE: &str = "README.txt";

/// Builds the table export archive
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    order_width: usize,
    format: ExportFormat,
    schema: String,
    exported_at: DateTime<Utc>,
}

impl ArchiveBuilder {
    pub fn new(registry: &SchemaRegistry, format: ExportFormat, schema: impl Into<String>) -> Self {
        Self {
            order_width: registry.order_width(),
            format,
            schema: schema.into(),
            exported_at: Utc::now(),
        }
    }

    /// Override the timestamp written to the manifests
    pub fn with_exported_at(mut self, exported_at: DateTime<Utc>) -> Self {
        self.exported_at = exported_at;
        self
    }

    /// Zero-padded order prefix, e.g. `03`
    pub fn order_prefix(&self, table: &TableDefinition) -> String {
        format!("{:0width$}", table.order, width = self.order_width)
    }

    /// Archive entry name for a table's data file
    pub fn file_name(&self, table: &TableDefinition) -> String {
        format!(
            "{}_{}.{}",
            self.order_prefix(table),
            table.name,
            self.format.extension()
        )
    }

    /// Default archive file name for this run
    pub fn archive_name(&self) -> String {
        format!("ferry-tables-{}.zip", self.exported_at.format("%Y%m%d-%H%M%S"))
    }

    /// Write the archive to `writer`
    ///
    /// Outcomes are written in import order whatever order they arrive in.
    /// Failed and skipped tables get a manifest line but no data file.
    pub fn build<W: Write + Seek>(&self, outcomes: &[TableExportOutcome], writer: W) -> Result<W> {
        let mut ordered: Vec<&TableExportOutcome> = outcomes.iter().collect();
        ordered.sort_by_key(|o| o.table.order);

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        let mut zip = ZipWriter::new(writer);

        for outcome in &ordered {
            if let TableStatus::Exported(data) = &outcome.status {
                let name = self.file_name(&outcome.table);
                zip.start_file(name.as_str(), options)?;
                zip.write_all(self.format.render(data, &self.schema).as_bytes())?;
                tracing::debug!(entry = %name, rows = data.row_count(), "Added table to archive");
            }
        }

        zip.start_file(IMPORT_ORDER_FILE, options)?;
        zip.write_all(self.import_order(&ordered).as_bytes())?;

        zip.start_file(README_FILE, options)?;
        zip.write_all(self.readme(&ordered).as_bytes())?;

        Ok(zip.finish()?)
    }

    /// Write the archive into `dir` under [`archive_name`](Self::archive_name)
    pub fn write_to_dir(&self, outcomes: &[TableExportOutcome], dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| {
            FerryError::Io(format!("Failed to create output directory {}: {}", dir.display(), e))
        })?;
        let path = dir.join(self.archive_name());
        let file = File::create(&path)
            .map_err(|e| FerryError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
        self.build(outcomes, file)?;
        Ok(path)
    }

    /// Manifest line for one table
    ///
    /// `NN. ✓ name | label | N registros | Deps: a, b`, with
    /// ` | Error: <message>` appended for tables without a data file.
    pub fn manifest_line(&self, outcome: &TableExportOutcome) -> String {
        let table = &outcome.table;
        let mark = if outcome.is_success() { '✓' } else { '✗' };
        let deps = if table.dependencies.is_empty() {
            "-".to_string()
        } else {
            table
                .dependencies
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut line = format!(
            "{}. {} {} | {} | {} registros | Deps: {}",
            self.order_prefix(table),
            mark,
            table.name,
            table.label,
            outcome.row_count(),
            deps
        );
        if let Some(error) = outcome.error_message() {
            let _ = write!(line, " | Error: {}", error.replace('\n', " "));
        }
        line
    }

    fn import_order(&self, ordered: &[&TableExportOutcome]) -> String {
        let exported = ordered.iter().filter(|o| o.is_success()).count();
        let mut out = String::new();
        let _ = writeln!(out, "# Import order");
        let _ = writeln!(out, "# Exported at: {}", self.exported_at.to_rfc3339());
        let _ = writeln!(out, "# Format: {}", self.format);
        let _ = writeln!(
            out,
            "# Tables: {} exported, {} not exported",
            exported,
            ordered.len() - exported
        );
        out.push('\n');
        for outcome in ordered {
            out.push_str(&self.manifest_line(outcome));
            out.push('\n');
        }
        out
    }

    fn readme(&self, ordered: &[&TableExportOutcome]) -> String {
        let exported = ordered.iter().filter(|o| o.is_success()).count();
        let rows: usize = ordered.iter().map(|o| o.row_count()).sum();
        let null_rule = match self.format {
            ExportFormat::Csv => {
                "An empty, unquoted field is NULL. Every other value is double-quoted,\n\
                 with embedded quotes doubled. Files start with a UTF-8 byte order mark."
            }
            ExportFormat::Sql => {
                "NULL is written as the bare keyword NULL. Text is single-quoted with\n\
                 embedded quotes doubled. Numbers and booleans are unquoted."
            }
        };

        format!(
            "FERRY TABLE EXPORT\n\
             ==================\n\
             \n\
             Exported at: {exported_at}\n\
             Format: {format}\n\
             Schema: {schema}\n\
             Tables exported: {exported} of {total}\n\
             Rows exported: {rows}\n\
             \n\
             IMPORT PROCEDURE\n\
             ----------------\n\
             1. Create the destination schema before importing any data.\n\
             2. Load the data files in the order of their numeric prefix.\n\
             {imp} lists that order with each table's dependencies.\n\
             3. Tables marked ✗ in {imp} were not exported.\n\
             Rows that reference them will be reported as pending.\n\
             4. Run `ferry validate` on this archive before importing.\n\
             \n\
             NULL VALUES\n\
             -----------\n\
             {null_rule}\n",
            exported_at = self.exported_at.to_rfc3339(),
            format = self.format.extension().to_uppercase(),
            schema = self.schema,
            total = ordered.len(),
            imp = IMPORT_ORDER_FILE,
        )
    }
}
