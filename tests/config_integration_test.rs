//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interference between tests.

use ferry::config::{load_config, load_config_or_default};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("FERRY_APPLICATION_LOG_LEVEL");
    std::env::remove_var("FERRY_BACKEND_BASE_URL");
    std::env::remove_var("FERRY_BACKEND_API_KEY");
    std::env::remove_var("FERRY_BACKEND_ACCESS_TOKEN");
    std::env::remove_var("FERRY_EXPORT_FORMAT");
    std::env::remove_var("FERRY_EXPORT_PAGE_SIZE");
    std::env::remove_var("FERRY_STORAGE_BATCH_WIDTH");
    std::env::remove_var("TEST_FERRY_SERVICE_KEY");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"

[backend]
base_url = "https://clinic.example.co"
api_key = "anon-key"
access_token = "session-token"
schema = "clinic"
timeout_seconds = 30

[backend.retry]
max_retries = 5
base_delay_ms = 250
backoff = "exponential"
max_delay_ms = 4000
jitter = true

[export]
page_size = 500
format = "sql"
output_dir = "/tmp/ferry"
tables = ["branches", "rooms"]

[storage]
bucket = "patient-files"
prefix = "patients"
batch_width = 4

[validation]
max_listed_violations = 25

[registry]
path = "./registry.toml"

[logging]
local_enabled = true
local_path = "/tmp/ferry-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    let backend = config.backend.as_ref().unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(backend.schema, "clinic");
    assert_eq!(
        backend.access_token.as_ref().unwrap().expose_secret().as_str(),
        "session-token"
    );
    assert_eq!(backend.retry.max_retries, 5);
    assert!(backend.retry.jitter);
    assert_eq!(config.export.page_size, 500);
    assert_eq!(config.export.tables, vec!["branches", "rooms"]);
    assert_eq!(config.storage.as_ref().unwrap().batch_width, 4);
    assert_eq!(config.validation.max_listed_violations, 25);
    assert_eq!(config.registry.path.as_deref(), Some("./registry.toml"));
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_env_substitution_and_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_FERRY_SERVICE_KEY", "from-env");
    std::env::set_var("FERRY_EXPORT_FORMAT", "sql");
    std::env::set_var("FERRY_STORAGE_BATCH_WIDTH", "6");

    let file = write_config(
        r#"
[backend]
base_url = "https://clinic.example.co"
api_key = "${TEST_FERRY_SERVICE_KEY}"

[storage]
bucket = "patient-files"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config.backend.unwrap().api_key.expose_secret().as_str(),
        "from-env"
    );
    assert_eq!(config.export.format, "sql");
    assert_eq!(config.storage.unwrap().batch_width, 6);

    cleanup_env_vars();
}

#[test]
fn test_missing_env_vars_reported_together() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[backend]
base_url = "${TEST_FERRY_MISSING_URL}"
api_key = "${TEST_FERRY_MISSING_KEY}"
"#,
    );

    let message = load_config(file.path()).unwrap_err().to_string();
    assert!(message.contains("TEST_FERRY_MISSING_URL"));
    assert!(message.contains("TEST_FERRY_MISSING_KEY"));
}

#[test]
fn test_out_of_range_values_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    for contents in [
        "[export]\npage_size = 0\n",
        "[export]\npage_size = 1001\n",
        "[storage]\nbucket = \"b\"\nbatch_width = 0\n",
        "[backend]\nbase_url = \"ftp://x\"\napi_key = \"k\"\n",
        "[backend]\nbase_url = \"https://x\"\napi_key = \"k\"\n[backend.retry]\nbackoff = \"random\"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let file = write_config(contents);
        assert!(load_config(file.path()).is_err(), "accepted: {contents}");
    }
}

#[test]
fn test_offline_defaults_without_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let config = load_config_or_default("definitely-missing-ferry.toml").unwrap();
    assert!(config.backend.is_none());
    assert!(config.storage.is_none());
    assert_eq!(config.export.format, "csv");
    assert_eq!(config.export.page_size, 1000);
    assert_eq!(config.validation.max_listed_violations, 10);
}

#[test]
fn test_backend_from_environment_only() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("FERRY_BACKEND_BASE_URL", "https://env.example.co");
    std::env::set_var("FERRY_BACKEND_API_KEY", "env-key");

    let config = load_config_or_default("definitely-missing-ferry.toml").unwrap();
    let backend = config.backend.unwrap();
    assert_eq!(backend.base_url, "https://env.example.co");
    assert_eq!(backend.schema, "public");

    cleanup_env_vars();
}
