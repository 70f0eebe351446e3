//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "ferry.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Ferry configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your backend URL and bucket", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set FERRY_API_KEY");
                println!("     - Set FERRY_ACCESS_TOKEN to export as a signed-in user (optional)");
                println!("  3. Validate configuration: ferry validate-config");
                println!("  4. Check the import order: ferry schema");
                println!("  5. Run exports: ferry export-tables && ferry export-storage");
                println!("  6. Validate the archive: ferry validate ferry-export/ferry-tables-*.zip");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Ferry Configuration File
# Clinical records migration export and validation

[application]
log_level = "info"

[backend]
base_url = "https://clinic.example.co"
api_key = "${FERRY_API_KEY}"
# access_token = "${FERRY_ACCESS_TOKEN}"
schema = "public"

[backend.retry]
max_retries = 3
base_delay_ms = 1000

[export]
format = "csv"
output_dir = "./ferry-export"

[storage]
bucket = "patient-files"
batch_width = 3
output_dir = "./ferry-export"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Ferry Configuration File
# Clinical records migration export and validation
#
# This file contains all configuration options with examples and explanations.
# Any value may reference an environment variable as ${NAME}, and any key can
# be overridden with FERRY_<SECTION>_<KEY> (e.g. FERRY_EXPORT_FORMAT=sql).

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Source Backend
# Required by export-tables and export-storage only
# ============================================================================
[backend]
# Base URL of the backend project
base_url = "https://clinic.example.co"

# Project API key, sent as the apikey header (use environment variable)
api_key = "${FERRY_API_KEY}"

# Session token of a signed-in user; row-level security applies to it.
# When unset, the api_key is also used as the bearer token.
# access_token = "${FERRY_ACCESS_TOKEN}"

# Relational schema holding the clinical tables
schema = "public"

# Request timeout in seconds
timeout_seconds = 60

# TLS certificate verification
tls_verify = true

[backend.retry]
# Total attempts per request, including the first (1-10)
max_retries = 3

# Delay before the second attempt, in milliseconds
base_delay_ms = 1000

# "linear" waits base * attempt; "exponential" waits base * 2^(attempt-1)
backoff = "linear"

# Upper bound for any single delay
max_delay_ms = 30000

# Randomize each delay between 50% and 100% of its value
jitter = false

# ============================================================================
# Table Export
# ============================================================================
[export]
# Rows per request (1-1000)
page_size = 1000

# Output format: "csv" (UTF-8 with BOM) or "sql" (INSERT statements)
format = "csv"

# Directory where ferry-tables-<timestamp>.zip is written
output_dir = "./ferry-export"

# Export only these tables (empty = every registered table)
tables = []

# ============================================================================
# Object Storage Export
# ============================================================================
[storage]
# Bucket to export
bucket = "patient-files"

# Folder inside the bucket (empty = whole bucket)
prefix = ""

# Concurrent downloads per batch (1-16)
batch_width = 3

# Entries per folder listing request (1-1000)
list_page_size = 1000

# Directory where ferry-storage-<bucket>-<timestamp>.zip is written
output_dir = "./ferry-export"

# ============================================================================
# Offline Validation
# ============================================================================
[validation]
# Violations listed per category before "... and N more"
max_listed_violations = 10

# ============================================================================
# Schema Registry
# ============================================================================
[registry]
# TOML registry replacing the built-in clinical catalog
# path = "./registry.toml"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}
