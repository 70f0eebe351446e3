//! Storage export: list, download in bounded batches, bundle

use super::listing::{list_objects, ListedObject};
use super::manifest::{DownloadOutcome, StorageExportReport, ERRORS_FILE, MANIFEST_FILE};
use crate::adapters::backend::ObjectStore;
use crate::config::StorageConfig;
use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{FerryError, Result};
use chrono::Utc;
use futures::future::join_all;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default number of concurrent downloads per batch
pub const DEFAULT_BATCH_WIDTH: usize = 3;

/// Where a storage export run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Listing,
    Downloading,
    Bundling,
    Completed,
}

/// Options for a storage export run
#[derive(Debug, Clone)]
pub struct StorageExportOptions {
    pub bucket: String,
    /// Folder prefix to export; empty exports the whole bucket
    pub prefix: String,
    pub batch_width: usize,
    pub list_page_size: usize,
    pub output_dir: PathBuf,
}

impl StorageExportOptions {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
            batch_width: config.batch_width,
            list_page_size: config.list_page_size,
            output_dir: PathBuf::from(&config.output_dir),
        }
    }
}

/// Exports every object under a prefix into one zip archive
pub struct ObjectStoreExporter {
    store: Arc<dyn ObjectStore>,
    options: StorageExportOptions,
    retry: RetryPolicy,
    shutdown: ShutdownSignal,
    progress: Arc<dyn ProgressSink>,
    phase: ExportPhase,
}

impl ObjectStoreExporter {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        options: StorageExportOptions,
        retry: RetryPolicy,
        shutdown: ShutdownSignal,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            store,
            options,
            retry,
            shutdown,
            progress,
            phase: ExportPhase::Idle,
        }
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    fn transition(&mut self, next: ExportPhase) {
        tracing::debug!(from = ?self.phase, to = ?next, "Storage export phase");
        self.phase = next;
    }

    /// Archive file name for this run
    pub fn archive_name(&self, report: &StorageExportReport) -> String {
        let bucket: String = self
            .options
            .bucket
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!(
            "ferry-storage-{}-{}.zip",
            bucket,
            report.started_at.format("%Y%m%d-%H%M%S")
        )
    }

    /// Run the export into `writer`
    ///
    /// Successful downloads are written to the archive as soon as their batch
    /// completes. `_MANIFEST.txt` is always written; `_ERRORS.txt` only when
    /// an object or folder failed.
    ///
    /// # Errors
    ///
    /// Fails when the export root cannot be listed, or when the archive itself
    /// cannot be written.
    pub async fn run<W>(&mut self, writer: W) -> Result<(StorageExportReport, W)>
    where
        W: Write + Seek + Send,
    {
        let mut report = StorageExportReport::new(&self.options.bucket, &self.options.prefix);

        self.transition(ExportPhase::Listing);
        tracing::info!(
            bucket = %self.options.bucket,
            prefix = %self.options.prefix,
            "Listing storage objects"
        );
        let listing = list_objects(
            self.store.as_ref(),
            &self.options.prefix,
            self.options.list_page_size,
            &self.retry,
            &self.shutdown,
            self.progress.as_ref(),
        )
        .await?;

        report.objects_listed = listing.objects.len();
        report.folders_listed = listing.folders;
        report.folder_errors = listing.folder_errors;
        report.interrupted = listing.interrupted;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        let mut zip = ZipWriter::new(writer);

        self.transition(ExportPhase::Downloading);
        let width = self.options.batch_width.max(1);
        let total_batches = listing.objects.len().div_ceil(width);

        for (index, batch) in listing.objects.chunks(width).enumerate() {
            if report.interrupted || self.shutdown.is_requested() {
                tracing::warn!(
                    remaining = listing.objects.len() - report.outcomes.len(),
                    "Shutdown requested, no further downloads will be issued"
                );
                self.progress.emit(ProgressEvent::Cancelled);
                report.interrupted = true;
                break;
            }

            self.progress.emit(ProgressEvent::BatchStarted {
                batch: index + 1,
                total_batches,
                size: batch.len(),
            });

            let results = join_all(batch.iter().map(|object| self.download(object))).await;

            for (outcome, bytes) in results {
                if let (DownloadOutcome::Success { path, .. }, Some(bytes)) = (&outcome, bytes) {
                    zip.start_file(path.as_str(), options)?;
                    zip.write_all(&bytes)?;
                }
                report.outcomes.push(outcome);
            }
        }

        self.transition(ExportPhase::Bundling);
        self.progress.emit(ProgressEvent::Bundling {
            entries: report.succeeded(),
        });
        report.finished_at = Utc::now();

        zip.start_file(MANIFEST_FILE, options)?;
        zip.write_all(report.render_manifest().as_bytes())?;
        if let Some(errors) = report.render_errors() {
            zip.start_file(ERRORS_FILE, options)?;
            zip.write_all(errors.as_bytes())?;
        }
        let writer = zip.finish()?;

        self.transition(ExportPhase::Completed);
        Ok((report, writer))
    }

    /// Run the export and write the archive to the output directory
    pub async fn execute(&mut self) -> Result<StorageExportReport> {
        let dir = self.options.output_dir.clone();
        create_output_dir(&dir)?;

        let staging = dir.join(format!(".ferry-storage-{}.partial", uuid::Uuid::new_v4()));
        let file = File::create(&staging)
            .map_err(|e| FerryError::Io(format!("Failed to create {}: {}", staging.display(), e)))?;

        let (mut report, file) = match self.run(file).await {
            Ok(done) => done,
            Err(e) => {
                let _ = std::fs::remove_file(&staging);
                return Err(e);
            }
        };
        drop(file);

        let path = dir.join(self.archive_name(&report));
        std::fs::rename(&staging, &path).map_err(|e| {
            FerryError::Io(format!("Failed to move archive to {}: {}", path.display(), e))
        })?;
        tracing::info!(path = %path.display(), "Archive written");

        report.archive_path = Some(path);
        report.log_summary();
        Ok(report)
    }

    /// Download one object with retries; bytes are returned on success only
    async fn download(&self, object: &ListedObject) -> (DownloadOutcome, Option<Vec<u8>>) {
        let path = object.path.as_str();
        let max_attempts = self.retry.max_attempts();
        let mut attempts = 0;

        let result = self
            .retry
            .run_until("download object", &self.shutdown, |attempt| {
                attempts = attempt;
                let store = Arc::clone(&self.store);
                let progress = Arc::clone(&self.progress);
                async move {
                    let result = store.download(path).await;
                    if let Err(ref e) = result {
                        if e.is_transient() && attempt < max_attempts {
                            progress.emit(ProgressEvent::DownloadRetry {
                                path: path.to_string(),
                                attempt: attempt + 1,
                                error: e.to_string(),
                            });
                        }
                    }
                    result
                }
            })
            .await;

        match result {
            Ok(bytes) => {
                let size_bytes = bytes.len() as u64;
                let sha256 = format!("{:x}", Sha256::digest(&bytes));
                self.progress.emit(ProgressEvent::ObjectDownloaded {
                    path: path.to_string(),
                    size_bytes,
                });
                (
                    DownloadOutcome::Success {
                        path: path.to_string(),
                        size_bytes,
                        sha256,
                        attempts,
                    },
                    Some(bytes),
                )
            }
            Err(failure) => {
                tracing::warn!(
                    path,
                    attempts = failure.attempts,
                    error = %failure.last_error,
                    "Download failed"
                );
                self.progress.emit(ProgressEvent::ObjectFailed {
                    path: path.to_string(),
                    error: failure.last_error.to_string(),
                });
                (
                    DownloadOutcome::Failure {
                        path: path.to_string(),
                        error_message: failure.last_error.to_string(),
                        attempts: failure.attempts,
                    },
                    None,
                )
            }
        }
    }
}

fn create_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        FerryError::Io(format!("Failed to create output directory {}: {}", dir.display(), e))
    })
}
