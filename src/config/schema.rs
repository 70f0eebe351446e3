//! Configuration schema types
//!
//! This module defines the configuration structure that maps to `ferry.toml`.

use crate::config::SecretString;
use serde::Deserialize;

/// Main Ferry configuration
///
/// The `backend` and `storage` sections are optional so that offline commands
/// (`validate`, `schema`, `safe-import-script`) run without credentials.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FerryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Source backend connection (required for exports)
    #[serde(default)]
    pub backend: Option<BackendConfig>,

    /// Table export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Object-storage export settings (required for `export-storage`)
    #[serde(default)]
    pub storage: Option<StorageConfig>,

    /// Offline validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Schema registry source
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FerryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        if let Some(ref backend) = self.backend {
            backend.validate()?;
        }
        self.export.validate()?;
        if let Some(ref storage) = self.storage {
            storage.validate()?;
        }
        self.validation.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Backend section, or an error naming what is missing
    pub fn require_backend(&self) -> Result<&BackendConfig, String> {
        self.backend
            .as_ref()
            .ok_or_else(|| "[backend] configuration is required for this command".to_string())
    }

    /// Storage section, or an error naming what is missing
    pub fn require_storage(&self) -> Result<&StorageConfig, String> {
        self.storage
            .as_ref()
            .ok_or_else(|| "[storage] configuration is required for this command".to_string())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration shared by page fetches, folder listings and downloads
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff shape: "linear" (base * attempt) or "exponential" (base * 2^(attempt-1))
    #[serde(default = "default_backoff")]
    pub backoff: String,

    /// Upper bound for a single delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Randomize each delay between 50% and 100% of its computed value
    #[serde(default)]
    pub jitter: bool,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(format!(
                "backend.retry.max_retries must be between 1 and 10, got {}",
                self.max_retries
            ));
        }

        let valid_backoffs = ["linear", "exponential"];
        if !valid_backoffs.contains(&self.backoff.as_str()) {
            return Err(format!(
                "Invalid backend.retry.backoff '{}'. Must be one of: {}",
                self.backoff,
                valid_backoffs.join(", ")
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(format!(
                "backend.retry.max_delay_ms ({}) must be >= base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            ));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backoff: default_backoff(),
            max_delay_ms: default_max_delay_ms(),
            jitter: false,
        }
    }
}

/// Source backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend project (e.g. `https://project.example.co`)
    pub base_url: String,

    /// Project API key, sent as the `apikey` header
    pub api_key: SecretString,

    /// Session token for an authenticated user; falls back to `api_key`
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Relational schema holding the clinical tables
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl BackendConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("backend.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("backend.base_url must start with http:// or https://".to_string());
        }

        if self.api_key.expose_secret().is_empty() {
            return Err("backend.api_key cannot be empty".to_string());
        }

        if self.schema.is_empty() {
            return Err("backend.schema cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("backend.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate()?;
        Ok(())
    }
}

/// Table export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Rows per page; the row API refuses more than 1000
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Output format: "csv" or "sql"
    #[serde(default = "default_export_format")]
    pub format: String,

    /// Directory where the archive is written
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Restrict the export to these tables (empty = all registered tables)
    #[serde(default)]
    pub tables: Vec<String>,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=1000).contains(&self.page_size) {
            return Err(format!(
                "export.page_size must be between 1 and 1000, got {}",
                self.page_size
            ));
        }

        let valid_formats = ["csv", "sql"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(format!(
                "Invalid export.format '{}'. Must be one of: {}",
                self.format,
                valid_formats.join(", ")
            ));
        }

        if self.output_dir.is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            format: default_export_format(),
            output_dir: default_output_dir(),
            tables: Vec::new(),
        }
    }
}

/// Object-storage export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket to export
    pub bucket: String,

    /// Folder prefix inside the bucket (empty = whole bucket)
    #[serde(default)]
    pub prefix: String,

    /// Downloads issued concurrently per batch
    #[serde(default = "default_batch_width")]
    pub batch_width: usize,

    /// Entries requested per folder listing call
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,

    /// Directory where the archive is written
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("storage.bucket cannot be empty".to_string());
        }

        if self.batch_width == 0 || self.batch_width > 16 {
            return Err(format!(
                "storage.batch_width must be between 1 and 16, got {}",
                self.batch_width
            ));
        }

        if !(1..=1000).contains(&self.list_page_size) {
            return Err(format!(
                "storage.list_page_size must be between 1 and 1000, got {}",
                self.list_page_size
            ));
        }

        Ok(())
    }
}

/// Offline validation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Concrete violation lines listed per category before summarizing
    #[serde(default = "default_max_listed_violations")]
    pub max_listed_violations: usize,
}

impl ValidationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_listed_violations == 0 {
            return Err("validation.max_listed_violations must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_listed_violations: default_max_listed_violations(),
        }
    }
}

/// Schema registry source
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistryConfig {
    /// Path to a TOML registry file; the built-in clinical catalog is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff() -> String {
    "linear".to_string()
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_page_size() -> usize {
    1000
}

fn default_export_format() -> String {
    "csv".to_string()
}

fn default_output_dir() -> String {
    "./ferry-export".to_string()
}

fn default_batch_width() -> usize {
    3
}

fn default_list_page_size() -> usize {
    1000
}

fn default_max_listed_violations() -> usize {
    10
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
