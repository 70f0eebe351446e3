//! Paginated export of a single table
//!
//! Pages are fetched strictly one after another with an increasing offset.
//! The first page shorter than the page size ends the table. Each page fetch
//! runs through the shared [`RetryPolicy`].

use crate::adapters::backend::RowSource;
use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::core::registry::TableDefinition;
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{ExportedTable, FerryError, Result};
use std::sync::Arc;

/// Largest page the row API will return
pub const MAX_PAGE_SIZE: usize = 1000;

/// Exports one table at a time from a [`RowSource`]
pub struct TableExporter {
    source: Arc<dyn RowSource>,
    page_size: usize,
    retry: RetryPolicy,
    shutdown: ShutdownSignal,
    progress: Arc<dyn ProgressSink>,
}

impl TableExporter {
    pub fn new(
        source: Arc<dyn RowSource>,
        page_size: usize,
        retry: RetryPolicy,
        shutdown: ShutdownSignal,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            retry,
            shutdown,
            progress,
        }
    }

    /// Fetch every row of `table`
    ///
    /// # Errors
    ///
    /// - [`FerryError::Backend`] with the last error when a page fetch fails
    ///   after retries
    /// - [`FerryError::Cancelled`] when shutdown is requested mid-table;
    ///   rows fetched so far are discarded
    pub async fn export(&self, table: &TableDefinition) -> Result<ExportedTable> {
        let name = &table.name;

        let expected_rows = match self.source.count_rows(name).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(table = %name, error = %e, "Row count unavailable");
                None
            }
        };
        self.progress.emit(ProgressEvent::TableStarted {
            table: name.clone(),
            order: table.order,
            expected_rows,
        });

        let mut rows = Vec::with_capacity(expected_rows.unwrap_or(0).min(100_000) as usize);
        let mut offset = 0;

        loop {
            if self.shutdown.is_requested() {
                return Err(FerryError::Cancelled);
            }

            let page_size = self.page_size;
            let page = self
                .retry
                .run_until("fetch page", &self.shutdown, |_| {
                    self.source.fetch_page(name, offset, page_size)
                })
                .await
                .map_err(|failure| {
                    if failure.cancelled {
                        return FerryError::Cancelled;
                    }
                    tracing::error!(
                        table = %name,
                        offset,
                        attempts = failure.attempts,
                        error = %failure.last_error,
                        "Page fetch failed"
                    );
                    FerryError::Backend(failure.last_error)
                })?;

            let fetched = page.len();
            rows.extend(page);
            self.progress.emit(ProgressEvent::PageFetched {
                table: name.clone(),
                offset,
                rows: fetched,
            });

            if fetched < page_size {
                break;
            }
            offset += fetched;
        }

        if let Some(expected) = expected_rows {
            if expected != rows.len() as u64 {
                tracing::warn!(
                    table = %name,
                    expected,
                    fetched = rows.len(),
                    "Row count changed during export"
                );
            }
        }

        Ok(ExportedTable::new(name.clone(), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::NoopProgress;
    use crate::core::registry::TableCategory;
    use crate::domain::{BackendError, CellValue, ExportedRow, TableName};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves `total` rows and records every requested offset
    struct FakeSource {
        total: usize,
        failures_before_success: Mutex<usize>,
        offsets: Mutex<Vec<usize>>,
    }

    impl FakeSource {
        fn new(total: usize) -> Self {
            Self {
                total,
                failures_before_success: Mutex::new(0),
                offsets: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RowSource for FakeSource {
        async fn fetch_page(
            &self,
            _table: &TableName,
            offset: usize,
            limit: usize,
        ) -> std::result::Result<Vec<ExportedRow>, BackendError> {
            {
                let mut failures = self.failures_before_success.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(BackendError::Timeout("slow".to_string()));
                }
            }
            self.offsets.lock().unwrap().push(offset);
            let end = (offset + limit).min(self.total);
            Ok((offset..end)
                .map(|i| ExportedRow::new().with("id", CellValue::Text(format!("r{i}"))))
                .collect())
        }

        async fn count_rows(&self, _table: &TableName) -> std::result::Result<u64, BackendError> {
            Ok(self.total as u64)
        }
    }

    fn definition() -> TableDefinition {
        TableDefinition {
            name: TableName::new("patients").unwrap(),
            label: "Pacientes".to_string(),
            category: TableCategory::Patients,
            order: 16,
            dependencies: Default::default(),
        }
    }

    fn exporter(source: Arc<FakeSource>, page_size: usize) -> TableExporter {
        TableExporter::new(
            source,
            page_size,
            RetryPolicy::new(3, Duration::from_millis(10)),
            ShutdownSignal::never(),
            Arc::new(NoopProgress),
        )
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let source = Arc::new(FakeSource::new(25));
        let table = exporter(source.clone(), 10).export(&definition()).await.unwrap();

        assert_eq!(table.row_count(), 25);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_empty_page() {
        let source = Arc::new(FakeSource::new(20));
        let table = exporter(source.clone(), 10).export(&definition()).await.unwrap();

        assert_eq!(table.row_count(), 20);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn test_empty_table() {
        let source = Arc::new(FakeSource::new(0));
        let table = exporter(source, 1000).export(&definition()).await.unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_page_errors_are_retried() {
        let source = Arc::new(FakeSource::new(5));
        *source.failures_before_success.lock().unwrap() = 2;

        let table = exporter(source, 10).export(&definition()).await.unwrap();
        assert_eq!(table.row_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_reports_backend_error() {
        let source = Arc::new(FakeSource::new(5));
        *source.failures_before_success.lock().unwrap() = 10;

        let err = exporter(source, 10).export(&definition()).await.unwrap_err();
        assert!(matches!(err, FerryError::Backend(BackendError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_shutdown_stops_before_first_page() {
        let (tx, rx) = tokio::sync::watch::channel(false);
        tx.send(true).unwrap();
        let source = Arc::new(FakeSource::new(5));
        let exporter = TableExporter::new(
            source.clone(),
            10,
            RetryPolicy::default(),
            ShutdownSignal::new(rx),
            Arc::new(NoopProgress),
        );

        let err = exporter.export(&definition()).await.unwrap_err();
        assert!(matches!(err, FerryError::Cancelled));
        assert!(source.offsets.lock().unwrap().is_empty());
    }
}
