//! Export coordinator - orchestrates a full table export run
//!
//! Tables are exported one at a time in import order. A table that fails is
//! recorded and the run moves on. An authentication failure stops further
//! requests, since every later one would fail the same way, but the tables
//! already fetched are still archived.

use super::archive::ArchiveBuilder;
use super::serialize::ExportFormat;
use super::summary::{ExportSummary, TableExportOutcome};
use super::table::TableExporter;
use crate::adapters::backend::RowSource;
use crate::config::ExportConfig;
use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::core::registry::{SchemaRegistry, TableDefinition};
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{BackendError, FerryError, Result, TableName};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Settings for one table export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub page_size: usize,
    /// Schema qualifying the SQL `INSERT` targets
    pub schema: String,
    /// Subset of tables to export; empty means all
    pub tables: Vec<TableName>,
    pub output_dir: PathBuf,
}

impl ExportOptions {
    /// Build options from the `[export]` section
    pub fn from_config(config: &ExportConfig, schema: impl Into<String>) -> Result<Self> {
        let tables = config
            .tables
            .iter()
            .map(|t| TableName::new(t.trim()).map_err(FerryError::Configuration))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            format: config.format.parse()?,
            page_size: config.page_size,
            schema: schema.into(),
            tables,
            output_dir: PathBuf::from(&config.output_dir),
        })
    }
}

/// Outcomes of the table phase of a run
#[derive(Debug)]
pub struct TableRun {
    /// One outcome per selected table, in import order
    pub outcomes: Vec<TableExportOutcome>,
    /// Shutdown was requested before every table was attempted
    pub interrupted: bool,
    /// The backend rejected the credentials; later tables were skipped
    pub auth_failure: Option<BackendError>,
}

impl TableRun {
    fn stopped(&self) -> bool {
        self.interrupted || self.auth_failure.is_some()
    }
}

/// Export coordinator
pub struct ExportCoordinator {
    registry: Arc<SchemaRegistry>,
    exporter: TableExporter,
    options: ExportOptions,
    shutdown: ShutdownSignal,
    progress: Arc<dyn ProgressSink>,
}

impl ExportCoordinator {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        source: Arc<dyn RowSource>,
        options: ExportOptions,
        retry: RetryPolicy,
        shutdown: ShutdownSignal,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let exporter = TableExporter::new(
            source,
            options.page_size,
            retry,
            shutdown.clone(),
            progress.clone(),
        );
        Self {
            registry,
            exporter,
            options,
            shutdown,
            progress,
        }
    }

    /// Tables this run will export, in import order
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming any requested table that is not
    /// registered.
    pub fn selected_tables(&self) -> Result<Vec<&TableDefinition>> {
        if self.options.tables.is_empty() {
            return Ok(self.registry.tables().iter().collect());
        }

        let unknown: Vec<&str> = self
            .options
            .tables
            .iter()
            .filter(|t| !self.registry.contains(t.as_str()))
            .map(TableName::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(FerryError::Configuration(format!(
                "Unknown tables requested: {}",
                unknown.join(", ")
            )));
        }

        Ok(self
            .registry
            .tables()
            .iter()
            .filter(|t| self.options.tables.contains(&t.name))
            .collect())
    }

    /// Export every selected table, isolating failures per table
    ///
    /// Outcomes come back in import order. Shutdown and authentication
    /// failures both stop further requests; the tables not reached are
    /// marked skipped so the archive can still be written.
    pub async fn export_tables(&self) -> Result<TableRun> {
        let tables = self.selected_tables()?;
        let mut run = TableRun {
            outcomes: Vec::with_capacity(tables.len()),
            interrupted: false,
            auth_failure: None,
        };

        for table in tables {
            if run.stopped() {
                run.outcomes.push(TableExportOutcome::skipped(table.clone()));
                continue;
            }
            if self.shutdown.is_requested() {
                self.progress.emit(ProgressEvent::Cancelled);
                run.interrupted = true;
                run.outcomes.push(TableExportOutcome::skipped(table.clone()));
                continue;
            }

            match self.exporter.export(table).await {
                Ok(data) => {
                    self.progress.emit(ProgressEvent::TableFinished {
                        table: table.name.clone(),
                        rows: data.row_count(),
                    });
                    run.outcomes.push(TableExportOutcome::exported(table.clone(), data));
                }
                Err(FerryError::Cancelled) => {
                    self.progress.emit(ProgressEvent::Cancelled);
                    run.interrupted = true;
                    run.outcomes.push(TableExportOutcome::skipped(table.clone()));
                }
                Err(FerryError::Backend(e @ BackendError::AuthenticationFailed(_))) => {
                    let error = e.to_string();
                    tracing::error!(
                        table = %table.name,
                        error = %error,
                        "Authentication rejected; no further tables will be requested"
                    );
                    self.progress.emit(ProgressEvent::TableFailed {
                        table: table.name.clone(),
                        error: error.clone(),
                    });
                    run.outcomes.push(TableExportOutcome::failed(table.clone(), error));
                    run.auth_failure = Some(e);
                }
                Err(e) => {
                    let error = e.to_string();
                    self.progress.emit(ProgressEvent::TableFailed {
                        table: table.name.clone(),
                        error: error.clone(),
                    });
                    run.outcomes.push(TableExportOutcome::failed(table.clone(), error));
                }
            }
        }

        Ok(run)
    }

    /// Run the export and write the archive to the output directory
    ///
    /// The archive is written even when some tables failed, the run was
    /// interrupted, or the backend rejected the credentials midway; the
    /// manifest says which tables are missing and
    /// [`ExportSummary::auth_failure`] records the rejection.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new(self.options.format);

        tracing::info!(
            format = %self.options.format,
            page_size = self.options.page_size,
            "Starting table export"
        );

        let TableRun {
            outcomes,
            interrupted,
            auth_failure,
        } = self.export_tables().await?;
        summary.interrupted = interrupted;
        summary.auth_failure = auth_failure;

        let builder = ArchiveBuilder::new(&self.registry, self.options.format, &self.options.schema)
            .with_exported_at(summary.started_at);
        let dir = self.options.output_dir.clone();
        self.progress.emit(ProgressEvent::Bundling {
            entries: outcomes.iter().filter(|o| o.is_success()).count(),
        });

        let (outcomes, written) = tokio::task::spawn_blocking(move || {
            let written = builder.write_to_dir(&outcomes, &dir);
            (outcomes, written)
        })
        .await
        .map_err(|e| FerryError::Archive(format!("Archive task failed: {e}")))?;

        let path = written?;
        tracing::info!(path = %path.display(), "Archive written");

        summary.outcomes = outcomes;
        summary.archive_path = Some(path);
        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}
