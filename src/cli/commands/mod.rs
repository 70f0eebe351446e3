//! CLI command implementations
//!
//! This module contains all CLI command implementations and the helpers
//! they share.

pub mod export_storage;
pub mod export_tables;
pub mod init;
pub mod safe_import;
pub mod schema;
pub mod validate;
pub mod validate_config;

use crate::config::FerryConfig;
use crate::core::registry::SchemaRegistry;
use crate::domain::{BackendError, FerryError, Result};

/// Exit code: completed, nothing to report
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: completed with failures or findings
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: configuration or registry error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: backend unreachable or credentials rejected
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code: unexpected failure
pub const EXIT_FATAL: i32 = 5;
/// Exit code: stopped by SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit code for an error that ended a command
pub fn exit_code_for(error: &FerryError) -> i32 {
    match error {
        FerryError::Configuration(_) | FerryError::Registry(_) => EXIT_CONFIG,
        FerryError::Backend(
            BackendError::AuthenticationFailed(_)
            | BackendError::ConnectionFailed(_)
            | BackendError::Timeout(_),
        ) => EXIT_CONNECTION,
        FerryError::Cancelled => EXIT_INTERRUPTED,
        _ => EXIT_FATAL,
    }
}

/// The configured registry file, or the built-in clinical catalog
pub fn load_registry(config: &FerryConfig) -> Result<SchemaRegistry> {
    let registry = match &config.registry.path {
        Some(path) => {
            tracing::info!(path = %path, "Loading schema registry from file");
            SchemaRegistry::from_file(path)?
        }
        None => SchemaRegistry::clinical()?,
    };
    tracing::debug!(tables = registry.len(), "Schema registry loaded");
    Ok(registry)
}

/// Split a comma-separated CLI list
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Relational schema for SQL output, `public` without a backend section
pub fn target_schema(config: &FerryConfig) -> String {
    config
        .backend
        .as_ref()
        .map(|b| b.schema.clone())
        .unwrap_or_else(|| "public".to_string())
}
