//! Core business logic for Ferry.
//!
//! # Modules
//!
//! - [`registry`] - Table catalog, import order and foreign-key edges
//! - [`export`] - Paginated table export and archive assembly
//! - [`storage`] - Object storage listing, batched downloads and manifests
//! - [`validation`] - Offline foreign-key validation of an export
//! - [`report`] - Validation reports and the safe-import script
//! - [`retry`] - Retry policy shared by every backend call
//! - [`progress`] - Progress events emitted by long-running runs
//! - [`shutdown`] - Cooperative cancellation signal
//!
//! # Export Workflow
//!
//! 1. **Registry**: Build the [`registry::SchemaRegistry`] once; its order is checked at construction
//! 2. **Export tables**: Page through each table in import order
//! 3. **Bundle**: Write `NN_table.csv` files, `_IMPORT_ORDER.txt` and `README.txt`
//! 4. **Validate** (offline): Re-read the archive and classify every foreign key
//! 5. **Report**: Text/JSON report and a safe-import SQL template
//!
//! # Example
//!
//! ```rust,no_run
//! use ferry::core::registry::SchemaRegistry;
//! use ferry::core::validation::{ValidationInput, Validator};
//! use ferry::core::report::ReportGenerator;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::clinical()?;
//! let input = ValidationInput::from_paths(&["ferry-tables-20260101-120000.zip"])?;
//!
//! let run = Validator::new(&registry).validate(&input);
//! println!("{}", ReportGenerator::default().render_text(&run));
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod progress;
pub mod registry;
pub mod report;
pub mod retry;
pub mod shutdown;
pub mod storage;
pub mod validation;
