//! Object storage export
//!
//! A run lists every object under a prefix, downloads them in fixed-width
//! concurrent batches with retries, and bundles the successes together with
//! `_MANIFEST.txt` (and `_ERRORS.txt` when anything failed) into one zip.

pub mod exporter;
pub mod listing;
pub mod manifest;

pub use exporter::{ExportPhase, ObjectStoreExporter, StorageExportOptions, DEFAULT_BATCH_WIDTH};
pub use listing::{list_objects, FolderError, ListedObject, Listing};
pub use manifest::{DownloadOutcome, StorageExportReport, ERRORS_FILE, MANIFEST_FILE};
