//! Export outcomes and run summary

use crate::core::export::serialize::ExportFormat;
use crate::core::registry::TableDefinition;
use crate::domain::{BackendError, ExportedTable};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one table
#[derive(Debug, Clone)]
pub enum TableStatus {
    /// All pages were fetched
    Exported(ExportedTable),
    /// A page fetch failed after retries; the table has no data file
    Failed { error: String },
    /// Not attempted, or abandoned, because shutdown was requested
    Skipped,
}

/// Result of exporting one table, paired with its definition
#[derive(Debug, Clone)]
pub struct TableExportOutcome {
    pub table: TableDefinition,
    pub status: TableStatus,
}

impl TableExportOutcome {
    pub fn exported(table: TableDefinition, data: ExportedTable) -> Self {
        Self {
            table,
            status: TableStatus::Exported(data),
        }
    }

    pub fn failed(table: TableDefinition, error: impl Into<String>) -> Self {
        Self {
            table,
            status: TableStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn skipped(table: TableDefinition) -> Self {
        Self {
            table,
            status: TableStatus::Skipped,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TableStatus::Exported(_))
    }

    /// Rows exported (zero unless successful)
    pub fn row_count(&self) -> usize {
        match &self.status {
            TableStatus::Exported(data) => data.row_count(),
            _ => 0,
        }
    }

    /// Failure text for the manifest, if the table has no data file
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            TableStatus::Exported(_) => None,
            TableStatus::Failed { error } => Some(error),
            TableStatus::Skipped => Some("not exported (run interrupted)"),
        }
    }
}

/// Summary of a table export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub started_at: DateTime<Utc>,

    /// Duration of the export
    pub duration: Duration,

    pub format: ExportFormat,

    /// One outcome per selected table, in import order
    pub outcomes: Vec<TableExportOutcome>,

    /// Shutdown was requested before every table was attempted
    pub interrupted: bool,

    /// The backend rejected the credentials and the run stopped early
    pub auth_failure: Option<BackendError>,

    /// Where the archive was written
    pub archive_path: Option<PathBuf>,
}

impl ExportSummary {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            started_at: Utc::now(),
            duration: Duration::from_secs(0),
            format,
            outcomes: Vec::new(),
            interrupted: false,
            auth_failure: None,
            archive_path: None,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn tables_exported(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn tables_failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TableStatus::Failed { .. }))
            .count()
    }

    pub fn tables_skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TableStatus::Skipped))
            .count()
    }

    pub fn total_rows(&self) -> usize {
        self.outcomes.iter().map(TableExportOutcome::row_count).sum()
    }

    /// Check if the export was successful (every table exported)
    pub fn is_successful(&self) -> bool {
        !self.interrupted
            && self.auth_failure.is_none()
            && self.outcomes.iter().all(TableExportOutcome::is_success)
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 100.0;
        }
        (self.tables_exported() as f64 / self.outcomes.len() as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            tables = self.outcomes.len(),
            exported = self.tables_exported(),
            failed = self.tables_failed(),
            skipped = self.tables_skipped(),
            rows = self.total_rows(),
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            interrupted = self.interrupted,
            auth_failure = self.auth_failure.is_some(),
            "Table export completed"
        );

        for outcome in &self.outcomes {
            if let TableStatus::Failed { error } = &outcome.status {
                tracing::warn!(table = %outcome.table.name, error = %error, "Table not exported");
            }
        }
    }
}
