//! Validation reports and the safe-import SQL template

pub mod safe_import;
pub mod text;

pub use safe_import::SafeImportScript;
pub use text::{ReportGenerator, DEFAULT_MAX_LISTED};
