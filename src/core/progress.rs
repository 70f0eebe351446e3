//! Progress events for long-running exports
//!
//! Engines emit [`ProgressEvent`]s to a [`ProgressSink`] and know nothing about
//! how they are presented. The CLI logs them through [`TracingProgress`];
//! tests collect them through a channel.

use crate::domain::TableName;
use tokio::sync::mpsc::UnboundedSender;

/// A discrete step of an export run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A table export began
    TableStarted {
        table: TableName,
        order: u32,
        expected_rows: Option<u64>,
    },
    /// One page of rows was retrieved
    PageFetched {
        table: TableName,
        offset: usize,
        rows: usize,
    },
    /// A table finished exporting
    TableFinished { table: TableName, rows: usize },
    /// A table failed and was left out of the archive
    TableFailed { table: TableName, error: String },
    /// A storage folder is being listed
    ListingFolder { prefix: String },
    /// Storage listing completed
    ListingFinished { objects: usize, folders: usize },
    /// A download batch was issued
    BatchStarted {
        batch: usize,
        total_batches: usize,
        size: usize,
    },
    /// A download is being attempted again
    DownloadRetry {
        path: String,
        attempt: usize,
        error: String,
    },
    /// An object was downloaded
    ObjectDownloaded { path: String, size_bytes: u64 },
    /// An object failed permanently
    ObjectFailed { path: String, error: String },
    /// Writing archive entries and manifests
    Bundling { entries: usize },
    /// Shutdown was requested; no further requests will be issued
    Cancelled,
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Routes events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::TableStarted {
                table,
                order,
                expected_rows,
            } => {
                tracing::info!(
                    table = %table,
                    order,
                    expected_rows = ?expected_rows,
                    "Exporting table"
                );
            }
            ProgressEvent::PageFetched {
                table,
                offset,
                rows,
            } => {
                tracing::debug!(table = %table, offset, rows, "Fetched page");
            }
            ProgressEvent::TableFinished { table, rows } => {
                tracing::info!(table = %table, rows, "Table exported");
            }
            ProgressEvent::TableFailed { table, error } => {
                tracing::error!(table = %table, error = %error, "Table export failed");
            }
            ProgressEvent::ListingFolder { prefix } => {
                tracing::debug!(prefix = %prefix, "Listing folder");
            }
            ProgressEvent::ListingFinished { objects, folders } => {
                tracing::info!(objects, folders, "Listing complete");
            }
            ProgressEvent::BatchStarted {
                batch,
                total_batches,
                size,
            } => {
                tracing::info!(batch, total_batches, size, "Downloading batch");
            }
            ProgressEvent::DownloadRetry {
                path,
                attempt,
                error,
            } => {
                tracing::warn!(path = %path, attempt, error = %error, "Retrying download");
            }
            ProgressEvent::ObjectDownloaded { path, size_bytes } => {
                tracing::debug!(path = %path, size_bytes, "Downloaded");
            }
            ProgressEvent::ObjectFailed { path, error } => {
                tracing::error!(path = %path, error = %error, "Download failed");
            }
            ProgressEvent::Bundling { entries } => {
                tracing::info!(entries, "Writing archive");
            }
            ProgressEvent::Cancelled => {
                tracing::warn!("Shutdown requested, finishing in-flight work");
            }
        }
    }
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // A closed receiver means nobody is watching
        let _ = self.send(event);
    }
}
