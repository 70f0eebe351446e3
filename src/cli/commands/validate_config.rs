//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Ferry configuration file.

use super::{load_registry, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {}

impl ValidateConfigArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let registry = match load_registry(&config) {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Schema registry is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        match &config.backend {
            Some(backend) => {
                println!("  Backend: {}", backend.base_url);
                println!("  Schema: {}", backend.schema);
                println!(
                    "  Session token: {}",
                    if backend.access_token.is_some() {
                        "configured"
                    } else {
                        "not set (using api_key)"
                    }
                );
                println!(
                    "  Retry: {} attempts, {}ms base, {} backoff",
                    backend.retry.max_retries, backend.retry.base_delay_ms, backend.retry.backoff
                );
            }
            None => println!("  Backend: not configured (offline commands only)"),
        }
        println!("  Export Format: {}", config.export.format);
        println!("  Page Size: {}", config.export.page_size);
        println!("  Output Directory: {}", config.export.output_dir);
        match &config.storage {
            Some(storage) => println!(
                "  Storage: bucket '{}', batch width {}",
                storage.bucket, storage.batch_width
            ),
            None => println!("  Storage: not configured"),
        }
        println!(
            "  Registry: {} ({} tables)",
            config.registry.path.as_deref().unwrap_or("built-in clinical catalog"),
            registry.len()
        );
        println!();
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"https://clinic.example.co\"\napi_key = \"k\"\n",
        )
        .unwrap();

        let code = ValidateConfigArgs {}.execute(path.to_str().unwrap()).await.unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(&path, "[export]\npage_size = 5000\n").unwrap();

        let code = ValidateConfigArgs {}.execute(path.to_str().unwrap()).await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
