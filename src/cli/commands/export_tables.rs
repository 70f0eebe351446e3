//! Export-tables command implementation
//!
//! Exports every registered table (or a subset) from the row API into one
//! import-ordered zip archive.

use super::{
    exit_code_for, load_registry, parse_list, EXIT_CONFIG, EXIT_CONNECTION, EXIT_INTERRUPTED,
    EXIT_PARTIAL, EXIT_SUCCESS,
};
use crate::adapters::backend::{BackendClient, RestRowSource};
use crate::config::load_config;
use crate::core::export::{ExportCoordinator, ExportOptions};
use crate::core::progress::TracingProgress;
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownSignal;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export-tables command
#[derive(Args, Debug)]
pub struct ExportTablesArgs {
    /// Output format (csv or sql)
    #[arg(long)]
    pub format: Option<String>,

    /// Export only these tables (comma-separated)
    #[arg(long)]
    pub tables: Option<String>,

    /// Directory for the archive
    #[arg(short, long)]
    pub output: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ExportTablesArgs {
    /// Execute the export-tables command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting table export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(format) = &self.format {
            tracing::info!(format = %format, "Overriding export format from CLI");
            config.export.format = format.to_ascii_lowercase();
        }
        if let Some(tables) = &self.tables {
            let tables = parse_list(tables);
            tracing::info!(tables = ?tables, "Overriding table selection from CLI");
            config.export.tables = tables;
        }
        if let Some(output) = &self.output {
            config.export.output_dir = output.clone();
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let backend = match config.require_backend() {
            Ok(b) => b.clone(),
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let registry = match load_registry(&config) {
            Ok(r) => Arc::new(r),
            Err(e) => {
                tracing::error!(error = %e, "Schema registry is invalid");
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let options = match ExportOptions::from_config(&config.export, &backend.schema) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if !self.yes {
            println!("Export Configuration:");
            println!("  Backend: {}", backend.base_url);
            println!("  Schema: {}", backend.schema);
            println!("  Format: {}", options.format);
            println!(
                "  Tables: {}",
                if options.tables.is_empty() {
                    format!("all ({})", registry.len())
                } else {
                    options
                        .tables
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            );
            println!("  Output: {}", options.output_dir.display());
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(EXIT_SUCCESS);
            }
        }

        let client = match BackendClient::new(&backend) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create backend client");
                eprintln!("Failed to initialize export: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let coordinator = ExportCoordinator::new(
            registry,
            Arc::new(RestRowSource::new(client, &backend.schema)),
            options,
            RetryPolicy::from_config(&backend.retry),
            ShutdownSignal::new(shutdown_signal),
            Arc::new(TracingProgress),
        );

        println!("🚀 Starting table export...");
        println!();

        let summary = match coordinator.execute_export().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Table export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!();
        println!("📊 Export Summary:");
        println!("  Tables exported: {}", summary.tables_exported());
        println!("  Tables failed: {}", summary.tables_failed());
        println!("  Tables skipped: {}", summary.tables_skipped());
        println!("  Rows: {}", summary.total_rows());
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Success Rate: {:.2}%", summary.success_rate());
        if let Some(path) = &summary.archive_path {
            println!("  Archive: {}", path.display());
        }
        println!();

        let failed: Vec<_> = summary.outcomes.iter().filter(|o| !o.is_success()).collect();
        if !failed.is_empty() {
            println!("⚠️  Tables not in the archive:");
            for outcome in failed {
                println!(
                    "  - {}: {}",
                    outcome.table.name,
                    outcome.error_message().unwrap_or("unknown error")
                );
            }
            println!();
        }

        let exit_code = if let Some(e) = &summary.auth_failure {
            eprintln!("❌ {e}");
            println!(
                "⚠️  Export stopped: credentials were rejected. \
                 The archive holds the tables completed so far."
            );
            EXIT_CONNECTION
        } else if summary.interrupted {
            println!("⚠️  Export interrupted. The archive holds the tables completed so far.");
            tracing::info!("Export interrupted by user signal");
            EXIT_INTERRUPTED
        } else if summary.is_successful() {
            println!("✅ Export completed successfully!");
            EXIT_SUCCESS
        } else {
            println!("⚠️  Export completed with failures");
            EXIT_PARTIAL
        };

        Ok(exit_code)
    }
}
