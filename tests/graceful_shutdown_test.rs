//! Integration tests for graceful shutdown

use async_trait::async_trait;
use ferry::adapters::backend::{ObjectStore, RowSource, StorageEntry};
use ferry::core::export::{ExportCoordinator, ExportFormat, ExportOptions, TableStatus};
use ferry::core::progress::NoopProgress;
use ferry::core::registry::SchemaRegistry;
use ferry::core::retry::RetryPolicy;
use ferry::core::shutdown::ShutdownSignal;
use ferry::core::storage::{ObjectStoreExporter, StorageExportOptions};
use ferry::domain::{BackendError, CellValue, ExportedRow, TableName};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (tx, rx) = watch::channel(false);
    let signal = ShutdownSignal::new(rx);
    let waiter = signal.clone();

    assert!(!signal.is_requested());

    let handle = tokio::spawn(async move {
        waiter.wait().await;
        true
    });

    tx.send(true).unwrap();
    assert!(handle.await.unwrap());
    assert!(signal.is_requested());
}

/// Fires the shutdown signal while serving the first page it is asked for
struct InterruptingSource {
    shutdown_tx: watch::Sender<bool>,
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl RowSource for InterruptingSource {
    async fn fetch_page(
        &self,
        table: &TableName,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<ExportedRow>, BackendError> {
        self.fetched.lock().unwrap().push(table.to_string());
        let _ = self.shutdown_tx.send(true);
        Ok(vec![ExportedRow::new().with("id", CellValue::Text("row-1".to_string()))])
    }

    async fn count_rows(&self, _table: &TableName) -> Result<u64, BackendError> {
        Ok(1)
    }
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::from_toml_str(
        r#"
[[tables]]
name = "branches"
category = "organization"
order = 1

[[tables]]
name = "rooms"
category = "organization"
order = 2
dependencies = ["branches"]
foreign_keys = [{ column = "branch_id", references = "branches" }]

[[tables]]
name = "appointments"
category = "scheduling"
order = 3
dependencies = ["rooms"]
foreign_keys = [{ column = "room_id", references = "rooms" }]
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_table_export_stops_after_current_table() {
    let dir = TempDir::new().unwrap();
    let (tx, rx) = watch::channel(false);
    let source = Arc::new(InterruptingSource {
        shutdown_tx: tx,
        fetched: Mutex::new(Vec::new()),
    });

    let coordinator = ExportCoordinator::new(
        Arc::new(registry()),
        source.clone(),
        ExportOptions {
            format: ExportFormat::Csv,
            page_size: 100,
            schema: "public".to_string(),
            tables: Vec::new(),
            output_dir: dir.path().to_path_buf(),
        },
        RetryPolicy::new(3, Duration::from_millis(10)),
        ShutdownSignal::new(rx),
        Arc::new(NoopProgress),
    );

    let summary = coordinator.execute_export().await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(*source.fetched.lock().unwrap(), vec!["branches".to_string()]);
    assert_eq!(summary.tables_exported(), 1);
    assert_eq!(summary.tables_skipped(), 2);
    assert!(matches!(summary.outcomes[1].status, TableStatus::Skipped));

    // The partial archive is still written
    let archive = summary.archive_path.unwrap();
    assert!(archive.exists());
}

/// Fires the shutdown signal on the first download
struct InterruptingStore {
    shutdown_tx: watch::Sender<bool>,
    downloads: Mutex<usize>,
}

#[async_trait]
impl ObjectStore for InterruptingStore {
    async fn list(
        &self,
        prefix: &str,
        offset: usize,
        _limit: usize,
    ) -> Result<Vec<StorageEntry>, BackendError> {
        if !prefix.is_empty() || offset > 0 {
            return Ok(Vec::new());
        }
        Ok((1..=6)
            .map(|i| StorageEntry::file(format!("scan-{i}.pdf"), 8))
            .collect())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        *self.downloads.lock().unwrap() += 1;
        let _ = self.shutdown_tx.send(true);
        Ok(path.as_bytes().to_vec())
    }
}

#[tokio::test]
async fn test_storage_export_finishes_batch_in_flight() {
    let (tx, rx) = watch::channel(false);
    let store = Arc::new(InterruptingStore {
        shutdown_tx: tx,
        downloads: Mutex::new(0),
    });

    let mut exporter = ObjectStoreExporter::new(
        store.clone(),
        StorageExportOptions {
            bucket: "patient-files".to_string(),
            prefix: String::new(),
            batch_width: 2,
            list_page_size: 100,
            output_dir: std::env::temp_dir(),
        },
        RetryPolicy::new(3, Duration::from_millis(10)),
        ShutdownSignal::new(rx),
        Arc::new(NoopProgress),
    );

    let (report, _) = exporter.run(Cursor::new(Vec::new())).await.unwrap();

    assert!(report.interrupted);
    assert_eq!(*store.downloads.lock().unwrap(), 2);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.not_attempted(), 4);
    assert!(report.render_manifest().contains("Interrupted: yes"));
}
