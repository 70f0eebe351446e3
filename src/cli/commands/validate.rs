//! Validate command implementation
//!
//! Offline foreign-key validation of an export. Needs only the registry, so
//! it runs without a `[backend]` section.

use super::{exit_code_for, load_registry, target_schema, EXIT_CONFIG, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::config::load_config_or_default;
use crate::core::export::ExportFormat;
use crate::core::report::{ReportGenerator, SafeImportScript};
use crate::core::validation::{ValidationInput, Validator, Verdict};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Export archive (.zip) or table files (.csv / .sql)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the text report to this file instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Also write the JSON report
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Also write the safe-import script annotated with this run's counts
    #[arg(long)]
    pub script: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let registry = match load_registry(&config) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        tracing::info!(files = self.files.len(), "Loading export for validation");
        let input = match ValidationInput::from_paths(&self.files) {
            Ok(i) => i,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read export");
                eprintln!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
        };
        if input.is_empty() && input.file_errors().is_empty() {
            eprintln!("❌ No table files found in the given inputs");
            return Ok(EXIT_CONFIG);
        }

        let run = Validator::new(&registry).validate(&input);
        let generator = ReportGenerator::new(config.validation.max_listed_violations);
        let text = generator.render_text(&run);

        match &self.report {
            Some(path) => {
                std::fs::write(path, &text)?;
                println!("📝 Report written to {}", path.display());
            }
            None => print!("{text}"),
        }

        if let Some(path) = &self.json {
            std::fs::write(path, generator.render_json(&run)?)?;
            println!("📝 JSON report written to {}", path.display());
        }

        if let Some(path) = &self.script {
            let format: ExportFormat = config.export.format.parse()?;
            let script =
                SafeImportScript::new(&registry, target_schema(&config), format).render(Some(&run));
            std::fs::write(path, script)?;
            println!("📝 Safe-import script written to {}", path.display());
        }

        Ok(match run.verdict() {
            Verdict::Ready => EXIT_SUCCESS,
            Verdict::PendingOnly | Verdict::Incomplete | Verdict::HasInvalid => EXIT_PARTIAL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let branches = dir.path().join("02_branches.csv");
        std::fs::write(&branches, "\u{feff}id,organization_id\n\"b1\",\"o1\"\n").unwrap();
        let organizations = dir.path().join("01_organizations.csv");
        std::fs::write(&organizations, "\u{feff}id,owner_id\n\"o1\",\n").unwrap();

        let report = dir.path().join("report.txt");
        let json = dir.path().join("report.json");
        let args = ValidateArgs {
            files: vec![organizations, branches],
            report: Some(report.clone()),
            json: Some(json.clone()),
            script: None,
        };

        let code = args.execute("no-such-ferry.toml").await.unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        assert!(std::fs::read_to_string(report).unwrap().contains("Verdict: READY"));
        assert!(std::fs::read_to_string(json).unwrap().contains("\"branches\""));
    }

    #[tokio::test]
    async fn test_broken_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let branches = dir.path().join("02_branches.csv");
        std::fs::write(&branches, "id\n\"b1\"\n").unwrap();
        let rooms = dir.path().join("03_rooms.csv");
        std::fs::write(&rooms, "id,branch_id\n\"r1,b1\n").unwrap();

        let report = dir.path().join("report.txt");
        let json = dir.path().join("report.json");
        let args = ValidateArgs {
            files: vec![branches, rooms],
            report: Some(report.clone()),
            json: Some(json.clone()),
            script: None,
        };

        let code = args.execute("no-such-ferry.toml").await.unwrap();
        assert_eq!(code, EXIT_PARTIAL);
        let text = std::fs::read_to_string(report).unwrap();
        assert!(text.contains("Files not loaded (1):"));
        assert!(text.contains("03_rooms.csv: unterminated quoted field"));
        assert!(text.contains("[02] branches"));
        assert!(std::fs::read_to_string(json).unwrap().contains("\"file_errors\""));
    }

    #[tokio::test]
    async fn test_no_tables_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.txt");
        std::fs::write(&readme, "nothing").unwrap();

        let args = ValidateArgs {
            files: vec![readme],
            report: None,
            json: None,
            script: None,
        };
        assert_eq!(args.execute("no-such-ferry.toml").await.unwrap(), EXIT_CONFIG);
    }
}
