//! Table export: pagination, serialization and archive assembly
//!
//! - [`table`] fetches all rows of one table
//! - [`serialize`] renders rows as CSV or SQL
//! - [`archive`] bundles the files with `_IMPORT_ORDER.txt` and `README.txt`
//! - [`coordinator`] runs every table with per-table isolation

pub mod archive;
pub mod coordinator;
pub mod serialize;
pub mod summary;
pub mod table;

pub use archive::{ArchiveBuilder, IMPORT_ORDER_FILE, README_FILE};
pub use coordinator::{ExportCoordinator, ExportOptions, TableRun};
pub use serialize::{ExportFormat, UTF8_BOM};
pub use summary::{ExportSummary, TableExportOutcome, TableStatus};
pub use table::TableExporter;
