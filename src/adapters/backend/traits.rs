//! Backend trait definitions
//!
//! The export engines talk to the backend only through these traits, so they
//! can be driven by in-memory fakes in tests.

use crate::domain::{BackendError, ExportedRow, TableName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Paginated access to table rows
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch up to `limit` rows of `table` starting at `offset`
    ///
    /// A page shorter than `limit` means the table has no more rows.
    async fn fetch_page(
        &self,
        table: &TableName,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ExportedRow>, BackendError>;

    /// Exact number of rows in `table`
    async fn count_rows(&self, table: &TableName) -> Result<u64, BackendError>;
}

/// One entry of a storage folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Name relative to the listed prefix
    pub name: String,

    /// Folders have no object id and are listed further
    pub is_folder: bool,

    /// Object size, when the listing reports it
    pub size_bytes: Option<u64>,
}

impl StorageEntry {
    pub fn file(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
            size_bytes: Some(size_bytes),
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
            size_bytes: None,
        }
    }
}

/// Object storage with prefix listing and per-object download
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the direct children of `prefix` (one page)
    ///
    /// `prefix` is empty for the bucket root and never ends in `/`.
    async fn list(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StorageEntry>, BackendError>;

    /// Download the full contents of the object at `path`
    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError>;
}
