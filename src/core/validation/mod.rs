//! Offline referential validation of an export
//!
//! Tables are read back from the archive (or loose files) as string rows,
//! and every declared foreign key is classified as valid, pending, invalid
//! or an external identity reference. No backend access is needed.

pub mod parser;
pub mod result;
pub mod validator;

pub use parser::{
    parse_csv, parse_sql, table_name_from_file, FileError, ParsedTable, Row, ValidationInput,
};
pub use result::{ExternalRef, FkViolation, ValidationResult, ValidationRun, Verdict};
pub use validator::Validator;
