//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Ferry using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Ferry - clinical records migration export and validation
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(version, about, long_about = None)]
#[command(author = "Ferry Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ferry.toml", env = "FERRY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FERRY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every registered table into an import-ordered archive
    ExportTables(commands::export_tables::ExportTablesArgs),

    /// Export every object under a storage prefix into an archive
    ExportStorage(commands::export_storage::ExportStorageArgs),

    /// Validate foreign keys of an export offline
    Validate(commands::validate::ValidateArgs),

    /// Show the import order and table dependencies
    Schema(commands::schema::SchemaArgs),

    /// Write the safe-import SQL template
    SafeImportScript(commands::safe_import::SafeImportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate_config::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export_tables() {
        let cli = Cli::parse_from(["ferry", "export-tables"]);
        assert_eq!(cli.config, "ferry.toml");
        assert!(matches!(cli.command, Commands::ExportTables(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["ferry", "--config", "custom.toml", "schema"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["ferry", "--log-level", "debug", "export-storage"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ExportStorage(_)));
    }

    #[test]
    fn test_cli_parse_export_tables_overrides() {
        let cli = Cli::parse_from([
            "ferry",
            "export-tables",
            "--format",
            "sql",
            "--tables",
            "branches,rooms",
            "--yes",
        ]);
        let Commands::ExportTables(args) = cli.command else {
            panic!("expected export-tables");
        };
        assert_eq!(args.format.as_deref(), Some("sql"));
        assert_eq!(args.tables.as_deref(), Some("branches,rooms"));
        assert!(args.yes);
    }

    #[test]
    fn test_cli_parse_validate_requires_files() {
        assert!(Cli::try_parse_from(["ferry", "validate"]).is_err());

        let cli = Cli::parse_from(["ferry", "validate", "export.zip", "--report", "report.txt"]);
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.files.len(), 1);
        assert!(args.report.is_some());
    }

    #[test]
    fn test_cli_parse_schema_check() {
        let cli = Cli::parse_from(["ferry", "schema", "--check"]);
        assert!(matches!(cli.command, Commands::Schema(ref a) if a.check));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["ferry", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["ferry", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
