//! Breadth-first listing of a storage area
//!
//! Folders are discovered through an explicit work queue instead of
//! recursion, so deep trees cost heap, not stack.

use crate::adapters::backend::ObjectStore;
use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{FerryError, Result};
use std::collections::VecDeque;

/// An object found by the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    /// Full path inside the bucket
    pub path: String,
    pub size_bytes: Option<u64>,
}

/// A nested folder that could not be listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderError {
    pub prefix: String,
    pub error: String,
}

/// Everything the listing found
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub objects: Vec<ListedObject>,
    /// Folders listed, including the root
    pub folders: usize,
    pub folder_errors: Vec<FolderError>,
    /// Shutdown stopped the listing early
    pub interrupted: bool,
}

/// Join a folder prefix and an entry name
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// List every object under `root`
///
/// # Errors
///
/// Fails only when `root` itself cannot be listed. Nested folders that fail
/// after retries are recorded in [`Listing::folder_errors`].
pub async fn list_objects(
    store: &dyn ObjectStore,
    root: &str,
    page_size: usize,
    retry: &RetryPolicy,
    shutdown: &ShutdownSignal,
    progress: &dyn ProgressSink,
) -> Result<Listing> {
    let root = root.trim_matches('/').to_string();
    let page_size = page_size.max(1);
    let mut listing = Listing::default();
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(prefix) = queue.pop_front() {
        if shutdown.is_requested() {
            listing.interrupted = true;
            break;
        }

        progress.emit(ProgressEvent::ListingFolder {
            prefix: prefix.clone(),
        });
        listing.folders += 1;

        let mut offset = 0;
        loop {
            let page = retry
                .run_until("list folder", shutdown, |_| store.list(&prefix, offset, page_size))
                .await;

            let entries = match page {
                Ok(entries) => entries,
                Err(failure) if failure.cancelled && prefix == root => {
                    tracing::warn!(prefix = %prefix, "Root listing cancelled by shutdown");
                    return Err(FerryError::Cancelled);
                }
                Err(failure) if prefix == root => {
                    tracing::error!(
                        prefix = %prefix,
                        attempts = failure.attempts,
                        error = %failure.last_error,
                        "Cannot list export root"
                    );
                    return Err(FerryError::Backend(failure.last_error));
                }
                Err(failure) => {
                    if failure.cancelled {
                        listing.interrupted = true;
                    }
                    tracing::warn!(prefix = %prefix, error = %failure, "Folder listing failed");
                    listing.folder_errors.push(FolderError {
                        prefix: prefix.clone(),
                        error: failure.to_string(),
                    });
                    break;
                }
            };

            let count = entries.len();
            for entry in entries {
                let path = join_path(&prefix, &entry.name);
                if entry.is_folder {
                    queue.push_back(path);
                } else {
                    listing.objects.push(ListedObject {
                        path,
                        size_bytes: entry.size_bytes,
                    });
                }
            }

            if count < page_size {
                break;
            }
            offset += count;
        }
    }

    progress.emit(ProgressEvent::ListingFinished {
        objects: listing.objects.len(),
        folders: listing.folders,
    });
    Ok(listing)
}
