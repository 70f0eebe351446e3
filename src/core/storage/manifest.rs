//! Storage export outcomes and the `_MANIFEST.txt` / `_ERRORS.txt` files

use super::listing::FolderError;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Name of the run manifest inside the archive
pub const MANIFEST_FILE: &str = "_MANIFEST.txt";

/// Name of the failure list inside the archive
pub const ERRORS_FILE: &str = "_ERRORS.txt";

/// Final state of one object download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success {
        path: String,
        size_bytes: u64,
        /// Lowercase hex SHA-256 of the archived bytes
        sha256: String,
        attempts: usize,
    },
    Failure {
        path: String,
        error_message: String,
        attempts: usize,
    },
}

impl DownloadOutcome {
    pub fn path(&self) -> &str {
        match self {
            DownloadOutcome::Success { path, .. } | DownloadOutcome::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

/// Report of a storage export run
#[derive(Debug, Clone)]
pub struct StorageExportReport {
    pub bucket: String,
    pub prefix: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Objects found by the listing
    pub objects_listed: usize,
    pub folders_listed: usize,
    /// One entry per attempted download, in listing order
    pub outcomes: Vec<DownloadOutcome>,
    pub folder_errors: Vec<FolderError>,
    /// Shutdown stopped the run before every object was attempted
    pub interrupted: bool,
    pub archive_path: Option<PathBuf>,
}

impl StorageExportReport {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            started_at: now,
            finished_at: now,
            objects_listed: 0,
            folders_listed: 0,
            outcomes: Vec::new(),
            folder_errors: Vec::new(),
            interrupted: false,
            archive_path: None,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Listed objects never attempted because of shutdown
    pub fn not_attempted(&self) -> usize {
        self.objects_listed.saturating_sub(self.outcomes.len())
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                DownloadOutcome::Success { size_bytes, .. } => *size_bytes,
                DownloadOutcome::Failure { .. } => 0,
            })
            .sum()
    }

    /// Every listed object is in the archive
    pub fn is_successful(&self) -> bool {
        !self.interrupted && self.failed() == 0 && self.folder_errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.failed() > 0 || !self.folder_errors.is_empty()
    }

    /// Contents of `_MANIFEST.txt`
    pub fn render_manifest(&self) -> String {
        let duration = (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default();
        let prefix = if self.prefix.is_empty() {
            "(bucket root)"
        } else {
            self.prefix.as_str()
        };

        let mut out = String::new();
        let _ = writeln!(out, "# Storage export manifest");
        let _ = writeln!(out, "Bucket: {}", self.bucket);
        let _ = writeln!(out, "Prefix: {prefix}");
        let _ = writeln!(out, "Started: {}", self.started_at.to_rfc3339());
        let _ = writeln!(out, "Finished: {}", self.finished_at.to_rfc3339());
        let _ = writeln!(out, "Duration: {:.1}s", duration.as_secs_f64());
        let _ = writeln!(out, "Folders listed: {}", self.folders_listed);
        let _ = writeln!(out, "Objects listed: {}", self.objects_listed);
        let _ = writeln!(out, "Downloaded: {}", self.succeeded());
        let _ = writeln!(out, "Failed: {}", self.failed());
        let _ = writeln!(out, "Folders failed: {}", self.folder_errors.len());
        let _ = writeln!(out, "Not attempted: {}", self.not_attempted());
        let _ = writeln!(out, "Total bytes: {}", self.total_bytes());
        let _ = writeln!(out, "Interrupted: {}", if self.interrupted { "yes" } else { "no" });
        out.push('\n');
        let _ = writeln!(out, "# path | size_bytes | sha256");

        for outcome in &self.outcomes {
            if let DownloadOutcome::Success {
                path,
                size_bytes,
                sha256,
                ..
            } = outcome
            {
                let _ = writeln!(out, "{path} | {size_bytes} | {sha256}");
            }
        }
        out
    }

    /// Contents of `_ERRORS.txt`, or `None` when nothing failed
    pub fn render_errors(&self) -> Option<String> {
        if !self.has_errors() {
            return None;
        }

        let mut out = String::new();
        let _ = writeln!(out, "# Storage export errors");
        let _ = writeln!(
            out,
            "# {} object(s) and {} folder(s) failed. The objects listed below are NOT included in this archive.",
            self.failed(),
            self.folder_errors.len()
        );
        out.push('\n');

        for outcome in &self.outcomes {
            if let DownloadOutcome::Failure {
                path,
                error_message,
                attempts,
            } = outcome
            {
                let _ = writeln!(out, "{path} | attempts: {attempts} | error: {error_message}");
            }
        }
        for folder in &self.folder_errors {
            let _ = writeln!(out, "[folder] {} | error: {}", folder.prefix, folder.error);
        }
        Some(out)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            bucket = %self.bucket,
            listed = self.objects_listed,
            downloaded = self.succeeded(),
            failed = self.failed(),
            folders_failed = self.folder_errors.len(),
            bytes = self.total_bytes(),
            interrupted = self.interrupted,
            "Storage export completed"
        );
    }
}
