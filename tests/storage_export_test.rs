//! Object-storage export written to disk and read back

use async_trait::async_trait;
use ferry::adapters::backend::{ObjectStore, StorageEntry};
use ferry::core::progress::{NoopProgress, ProgressEvent};
use ferry::core::retry::RetryPolicy;
use ferry::core::shutdown::ShutdownSignal;
use ferry::core::storage::{
    DownloadOutcome, ObjectStoreExporter, StorageExportOptions, ERRORS_FILE, MANIFEST_FILE,
};
use ferry::domain::BackendError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Patient folders; listed paths in `broken_folders` always fail
struct PatientBucket {
    folders: HashMap<String, Vec<StorageEntry>>,
    transient_failures: Mutex<HashMap<String, usize>>,
    broken_folders: Vec<String>,
}

impl PatientBucket {
    fn new() -> Self {
        let folders = HashMap::from([
            (
                "patients".to_string(),
                vec![StorageEntry::folder("p-001"), StorageEntry::folder("p-002")],
            ),
            (
                "patients/p-001".to_string(),
                vec![
                    StorageEntry::file("consent.pdf", 30),
                    StorageEntry::file("xray.png", 27),
                ],
            ),
            (
                "patients/p-002".to_string(),
                vec![StorageEntry::file("labs.pdf", 27), StorageEntry::folder("scans")],
            ),
        ]);
        Self {
            folders,
            transient_failures: Mutex::new(HashMap::new()),
            broken_folders: Vec::new(),
        }
    }

    fn flaky(self, path: &str, times: usize) -> Self {
        self.transient_failures
            .lock()
            .unwrap()
            .insert(path.to_string(), times);
        self
    }

    fn broken(mut self, prefix: &str) -> Self {
        self.broken_folders.push(prefix.to_string());
        self
    }
}

fn unavailable() -> BackendError {
    BackendError::ServerError {
        status: 503,
        message: "storage unavailable".to_string(),
    }
}

fn contents(path: &str) -> Vec<u8> {
    format!("bytes of {path}").into_bytes()
}

#[async_trait]
impl ObjectStore for PatientBucket {
    async fn list(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StorageEntry>, BackendError> {
        if self.broken_folders.iter().any(|b| b == prefix) {
            return Err(unavailable());
        }
        let entries = self.folders.get(prefix).cloned().unwrap_or_default();
        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let mut failures = self.transient_failures.lock().unwrap();
        if let Some(left) = failures.get_mut(path) {
            if *left > 0 {
                *left -= 1;
                return Err(unavailable());
            }
        }
        Ok(contents(path))
    }
}

fn options(dir: &TempDir) -> StorageExportOptions {
    StorageExportOptions {
        bucket: "patient-files".to_string(),
        prefix: "patients".to_string(),
        batch_width: 3,
        list_page_size: 50,
        output_dir: dir.path().to_path_buf(),
    }
}

fn read_entry(path: &std::path::Path, name: &str) -> Option<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    Some(text)
}

#[tokio::test(start_paused = true)]
async fn test_retried_download_lands_in_manifest() {
    let dir = TempDir::new().unwrap();
    let store = PatientBucket::new().flaky("patients/p-001/consent.pdf", 2);
    let mut exporter = ObjectStoreExporter::new(
        Arc::new(store),
        options(&dir),
        RetryPolicy::new(3, Duration::from_millis(200)),
        ShutdownSignal::never(),
        Arc::new(NoopProgress),
    );

    let report = exporter.execute().await.unwrap();

    assert!(report.is_successful());
    assert_eq!(report.succeeded(), 3);
    let consent = report
        .outcomes
        .iter()
        .find(|o| o.path() == "patients/p-001/consent.pdf")
        .unwrap();
    assert!(matches!(consent, DownloadOutcome::Success { attempts: 3, .. }));

    let archive = report.archive_path.clone().unwrap();
    assert!(archive.starts_with(dir.path()));
    let name = archive.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("ferry-storage-patient-files-"));

    let manifest = read_entry(&archive, MANIFEST_FILE).unwrap();
    let digest = format!("{:x}", Sha256::digest(contents("patients/p-001/consent.pdf")));
    assert!(manifest.contains(&format!("patients/p-001/consent.pdf | 35 | {digest}")));
    assert!(manifest.contains("Prefix: patients\n"));
    assert!(read_entry(&archive, ERRORS_FILE).is_none());
    assert_eq!(
        read_entry(&archive, "patients/p-002/labs.pdf").unwrap(),
        "bytes of patients/p-002/labs.pdf"
    );

    // Only the finished archive remains
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failures_recorded_only_in_errors_file() {
    let dir = TempDir::new().unwrap();
    let store = PatientBucket::new()
        .flaky("patients/p-001/xray.png", 100)
        .broken("patients/p-002/scans");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut exporter = ObjectStoreExporter::new(
        Arc::new(store),
        options(&dir),
        RetryPolicy::new(3, Duration::from_millis(200)),
        ShutdownSignal::never(),
        Arc::new(tx),
    );

    let report = exporter.execute().await.unwrap();

    assert!(!report.is_successful());
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.folder_errors.len(), 1);

    let archive = report.archive_path.clone().unwrap();
    assert!(read_entry(&archive, "patients/p-001/xray.png").is_none());

    let manifest = read_entry(&archive, MANIFEST_FILE).unwrap();
    assert!(!manifest.contains("patients/p-001/xray.png"));
    assert!(manifest.contains("Failed: 1\n"));

    let errors = read_entry(&archive, ERRORS_FILE).unwrap();
    assert!(errors.contains("patients/p-001/xray.png | attempts: 3"));
    assert!(errors.contains("[folder] patients/p-002/scans"));

    let mut retries = 0;
    while let Ok(event) = rx.try_recv() {
        if let ProgressEvent::DownloadRetry { path, .. } = event {
            assert_eq!(path, "patients/p-001/xray.png");
            retries += 1;
        }
    }
    assert_eq!(retries, 2);
}
