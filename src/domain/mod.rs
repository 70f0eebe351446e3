//! Domain models and types for Ferry.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TableName`])
//! - **Row models** ([`CellValue`], [`ExportedRow`], [`ExportedTable`])
//! - **Error types** ([`FerryError`], [`BackendError`], [`RegistryError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, FerryError>`]:
//!
//! ```rust
//! use ferry::domain::{FerryError, Result};
//!
//! fn example() -> Result<()> {
//!     let registry = ferry::core::registry::SchemaRegistry::clinical()?;
//!     assert!(registry.get("patients").is_some());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod result;
pub mod row;

// Re-export commonly used types for convenience
pub use errors::{BackendError, FerryError, RegistryError};
pub use ids::TableName;
pub use result::Result;
pub use row::{CellValue, ExportedRow, ExportedTable};
