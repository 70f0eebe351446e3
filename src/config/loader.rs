//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{BackendConfig, FerryConfig};
use crate::config::secret_string;
use crate::domain::errors::FerryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`FerryConfig`]
/// 4. Applies environment variable overrides (`FERRY_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced environment
/// variable is missing, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use ferry::config::loader::load_config;
///
/// let config = load_config("ferry.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<FerryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FerryError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FerryError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Loads the configuration if the file exists, otherwise returns defaults
///
/// Offline commands use this so they work without a `ferry.toml`.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<FerryConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        let mut config = FerryConfig::default();
        apply_env_overrides(&mut config);
        config.validate().map_err(|e| {
            FerryError::Configuration(format!("Configuration validation failed: {e}"))
        })?;
        Ok(config)
    }
}

/// Parses configuration text (after reading) into a validated [`FerryConfig`]
pub fn parse_config(contents: &str) -> Result<FerryConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: FerryConfig = toml::from_str(&contents)
        .map_err(|e| FerryError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        FerryError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| FerryError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let replaced = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&replaced);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(FerryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `FERRY_*` prefix
///
/// Variables follow the pattern `FERRY_<SECTION>_<KEY>`, for example
/// `FERRY_BACKEND_BASE_URL` or `FERRY_EXPORT_FORMAT`. Backend overrides only
/// apply when a `[backend]` section exists, except that `FERRY_BACKEND_BASE_URL`
/// together with `FERRY_BACKEND_API_KEY` can create one.
fn apply_env_overrides(config: &mut FerryConfig) {
    if let Ok(val) = std::env::var("FERRY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if config.backend.is_none() {
        if let (Ok(base_url), Ok(api_key)) = (
            std::env::var("FERRY_BACKEND_BASE_URL"),
            std::env::var("FERRY_BACKEND_API_KEY"),
        ) {
            config.backend = Some(BackendConfig {
                base_url,
                api_key: secret_string(api_key),
                access_token: None,
                schema: "public".to_string(),
                timeout_seconds: 60,
                tls_verify: true,
                retry: Default::default(),
            });
        }
    }

    if let Some(ref mut backend) = config.backend {
        if let Ok(val) = std::env::var("FERRY_BACKEND_BASE_URL") {
            backend.base_url = val;
        }
        if let Ok(val) = std::env::var("FERRY_BACKEND_API_KEY") {
            backend.api_key = secret_string(val);
        }
        if let Ok(val) = std::env::var("FERRY_BACKEND_ACCESS_TOKEN") {
            backend.access_token = Some(secret_string(val));
        }
        if let Ok(val) = std::env::var("FERRY_BACKEND_SCHEMA") {
            backend.schema = val;
        }
        if let Ok(val) = std::env::var("FERRY_BACKEND_TLS_VERIFY") {
            backend.tls_verify = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("FERRY_BACKEND_RETRY_MAX_RETRIES") {
            if let Ok(retries) = val.parse() {
                backend.retry.max_retries = retries;
            }
        }
        if let Ok(val) = std::env::var("FERRY_BACKEND_RETRY_BACKOFF") {
            backend.retry.backoff = val;
        }
    }

    if let Ok(val) = std::env::var("FERRY_EXPORT_FORMAT") {
        config.export.format = val;
    }
    if let Ok(val) = std::env::var("FERRY_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Ok(val) = std::env::var("FERRY_EXPORT_PAGE_SIZE") {
        if let Ok(size) = val.parse() {
            config.export.page_size = size;
        }
    }

    if let Some(ref mut storage) = config.storage {
        if let Ok(val) = std::env::var("FERRY_STORAGE_BUCKET") {
            storage.bucket = val;
        }
        if let Ok(val) = std::env::var("FERRY_STORAGE_BATCH_WIDTH") {
            if let Ok(width) = val.parse() {
                storage.batch_width = width;
            }
        }
    }

    if let Ok(val) = std::env::var("FERRY_REGISTRY_PATH") {
        config.registry.path = Some(val);
    }

    if let Ok(val) = std::env::var("FERRY_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("FERRY_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
