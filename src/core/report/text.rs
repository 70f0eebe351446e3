//! Human-readable validation report

use crate::core::validation::{ExternalRef, FkViolation, ValidationResult, ValidationRun};
use crate::domain::Result;
use std::fmt::Write as _;

/// Default number of findings listed per category before summarizing
pub const DEFAULT_MAX_LISTED: usize = 10;

/// Renders validation runs as text or JSON
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    max_listed: usize,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LISTED)
    }
}

impl ReportGenerator {
    pub fn new(max_listed: usize) -> Self {
        Self { max_listed }
    }

    /// Text report: per-table counts and findings, totals, verdict
    pub fn render_text(&self, run: &ValidationRun) -> String {
        let mut out = String::new();
        let rule = "=".repeat(72);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "FERRY VALIDATION REPORT");
        let _ = writeln!(out, "Generated: {}", run.generated_at.to_rfc3339());
        let _ = writeln!(out, "Tables: {}", run.results.len());
        let _ = writeln!(out, "{rule}");

        if !run.file_errors.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "Files not loaded ({}):", run.file_errors.len());
            for error in &run.file_errors {
                let _ = writeln!(out, "  {}: {}", error.file, error.message);
            }
        }

        for result in &run.results {
            out.push('\n');
            self.write_table(&mut out, result);
        }

        out.push('\n');
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "TOTALS");
        let _ = writeln!(out, "  Records:  {}", run.total_records());
        let _ = writeln!(out, "  Valid:    {}", run.valid_records());
        let _ = writeln!(out, "  Pending:  {}", run.pending_records());
        let _ = writeln!(out, "  Invalid:  {}", run.invalid_records());
        let _ = writeln!(out, "  External identity references: {}", run.auth_user_refs());
        if !run.file_errors.is_empty() {
            let _ = writeln!(out, "  Files not loaded: {}", run.file_errors.len());
        }
        let _ = writeln!(out, "Verdict: {}", run.verdict());
        let _ = writeln!(out, "{rule}");
        out
    }

    /// Pretty JSON rendering of the run
    pub fn render_json(&self, run: &ValidationRun) -> Result<String> {
        run.to_json()
    }

    fn write_table(&self, out: &mut String, result: &ValidationResult) {
        let order = result
            .order
            .map(|o| format!("{o:02}"))
            .unwrap_or_else(|| "--".to_string());
        let _ = writeln!(out, "[{order}] {}", result.table);
        let _ = writeln!(
            out,
            "  total: {} | valid: {} | pending: {} | invalid: {} | external refs: {}",
            result.total_records,
            result.valid_records,
            result.pending_records,
            result.invalid_records,
            result.auth_user_refs
        );
        if result.order.is_none() {
            let _ = writeln!(out, "  (not in registry; foreign keys not checked)");
        }

        self.write_violations(out, "Invalid references", &result.invalid);
        self.write_violations(out, "Pending references", &result.pending);
        self.write_external(out, &result.external_refs);
    }

    fn write_violations(&self, out: &mut String, heading: &str, violations: &[FkViolation]) {
        if violations.is_empty() {
            return;
        }
        let _ = writeln!(out, "  {heading} ({}):", violations.len());
        for v in violations.iter().take(self.max_listed) {
            let _ = writeln!(
                out,
                "    row {}: {} -> {} '{}'",
                v.row_index + 1,
                v.column,
                v.target_table,
                v.missing_value
            );
        }
        self.write_remainder(out, violations.len());
    }

    fn write_external(&self, out: &mut String, refs: &[ExternalRef]) {
        if refs.is_empty() {
            return;
        }
        let _ = writeln!(out, "  External identity references ({}):", refs.len());
        for r in refs.iter().take(self.max_listed) {
            let _ = writeln!(out, "    row {}: {} = '{}'", r.row_index + 1, r.column, r.value);
        }
        self.write_remainder(out, refs.len());
    }

    fn write_remainder(&self, out: &mut String, total: usize) {
        if total > self.max_listed {
            let _ = writeln!(out, "    ... and {} more", total - self.max_listed);
        }
    }
}
