//! Configuration management for Ferry.
//!
//! Ferry uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `FERRY_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [backend]
//! base_url = "https://clinic.example.co"
//! api_key = "${FERRY_API_KEY}"
//! access_token = "${FERRY_ACCESS_TOKEN}"
//!
//! [backend.retry]
//! max_retries = 3
//! base_delay_ms = 1000
//!
//! [export]
//! format = "csv"
//! output_dir = "./exports"
//!
//! [storage]
//! bucket = "patient-files"
//! batch_width = 3
//! ```
//!
//! Only the sections a command needs are required: offline validation runs
//! with no file at all.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, BackendConfig, ExportConfig, FerryConfig, LoggingConfig, RegistryConfig,
    RetryConfig, StorageConfig, ValidationConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
