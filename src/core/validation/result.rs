//! Validation findings and per-table counts

use super::parser::FileError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A foreign-key value with no matching target row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FkViolation {
    /// 0-based row position in the table file
    pub row_index: usize,
    pub column: String,
    pub target_table: String,
    pub missing_value: String,
}

/// A reference to the external identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalRef {
    pub row_index: usize,
    pub column: String,
    pub value: String,
}

/// Counts and findings for one table
///
/// `pending_records` and `invalid_records` count findings, so they always
/// equal the lengths of `pending` and `invalid`. `valid_records` counts rows
/// with no finding at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub table: String,
    /// Import order, `None` for tables the registry does not know
    pub order: Option<u32>,
    pub total_records: usize,
    pub valid_records: usize,
    pub pending_records: usize,
    pub invalid_records: usize,
    /// External identity references found (one per value)
    pub auth_user_refs: usize,
    pub pending: Vec<FkViolation>,
    pub invalid: Vec<FkViolation>,
    pub external_refs: Vec<ExternalRef>,
}

impl ValidationResult {
    pub fn new(table: impl Into<String>, order: Option<u32>) -> Self {
        Self {
            table: table.into(),
            order,
            total_records: 0,
            valid_records: 0,
            pending_records: 0,
            invalid_records: 0,
            auth_user_refs: 0,
            pending: Vec::new(),
            invalid: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    /// `(total, valid, pending, invalid)`
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.total_records,
            self.valid_records,
            self.pending_records,
            self.invalid_records,
        )
    }

    pub fn is_clean(&self) -> bool {
        self.pending_records == 0 && self.invalid_records == 0
    }
}

/// Overall outcome of a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every reference resolved
    Ready,
    /// Only references to tables that load later or were not supplied
    PendingOnly,
    /// Some table files could not be read, so their rows were not checked
    Incomplete,
    /// At least one reference to an earlier, loaded table is missing
    HasInvalid,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ready => f.write_str("READY: all foreign keys resolve"),
            Verdict::PendingOnly => f.write_str(
                "PENDING: some references point at tables that load later or were not supplied",
            ),
            Verdict::Incomplete => {
                f.write_str("INCOMPLETE: some table files could not be read")
            }
            Verdict::HasInvalid => {
                f.write_str("INVALID: some references point at rows missing from an earlier table")
            }
        }
    }
}

/// Results of one validation run, in import order
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRun {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<ValidationResult>,
    /// Table files skipped because they failed to parse
    pub file_errors: Vec<FileError>,
}

impl ValidationRun {
    pub fn new(results: Vec<ValidationResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            results,
            file_errors: Vec::new(),
        }
    }

    pub fn get(&self, table: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.table == table)
    }

    pub fn total_records(&self) -> usize {
        self.results.iter().map(|r| r.total_records).sum()
    }

    pub fn valid_records(&self) -> usize {
        self.results.iter().map(|r| r.valid_records).sum()
    }

    pub fn pending_records(&self) -> usize {
        self.results.iter().map(|r| r.pending_records).sum()
    }

    pub fn invalid_records(&self) -> usize {
        self.results.iter().map(|r| r.invalid_records).sum()
    }

    pub fn auth_user_refs(&self) -> usize {
        self.results.iter().map(|r| r.auth_user_refs).sum()
    }

    pub fn verdict(&self) -> Verdict {
        if self.invalid_records() > 0 {
            Verdict::HasInvalid
        } else if !self.file_errors.is_empty() {
            Verdict::Incomplete
        } else if self.pending_records() > 0 {
            Verdict::PendingOnly
        } else {
            Verdict::Ready
        }
    }

    /// Pretty JSON for tooling
    pub fn to_json(&self) -> crate::domain::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
