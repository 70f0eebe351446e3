//! Domain error types
//!
//! This module defines the error hierarchy for Ferry. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Ferry error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors talking to the source backend (row API or object storage)
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The schema registry failed its startup invariant checks
    #[error("Schema registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Archive creation or reading errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Exported file could not be parsed back into rows
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The run was stopped by an operator shutdown request
    #[error("Operation cancelled by shutdown request")]
    Cancelled,
}

/// Backend-specific errors
///
/// Errors that occur when interacting with the row API or the object store.
/// These errors don't expose the HTTP client types.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Failed to connect to the backend
    #[error("Failed to connect to backend: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Object or table not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::ConnectionFailed(_)
                | BackendError::Timeout(_)
                | BackendError::RateLimited(_)
                | BackendError::ServerError { .. }
        )
    }
}

/// Schema registry construction errors
///
/// These are raised once, at startup, when the declared table catalog is
/// inconsistent. They never occur while exporting or validating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A table name does not follow identifier rules
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Two definitions share a name
    #[error("Table '{0}' is declared more than once")]
    DuplicateTable(String),

    /// Two definitions share an order position
    #[error("Tables '{first}' and '{second}' share import order {order}")]
    DuplicateOrder {
        order: u32,
        first: String,
        second: String,
    },

    /// A dependency is not loaded strictly before its dependent
    #[error(
        "Table '{table}' (order {table_order}) depends on '{dependency}' (order {dependency_order}), which is not earlier"
    )]
    OrderViolation {
        table: String,
        table_order: u32,
        dependency: String,
        dependency_order: u32,
    },

    /// A foreign-key edge starts at a table that is not registered
    #[error("Foreign key {table}.{column} belongs to an unregistered table")]
    UnknownEdgeSource { table: String, column: String },

    /// A foreign-key edge points at a registered table missing from the dependency set
    #[error("Foreign key {table}.{column} targets '{target}', which is not declared as a dependency")]
    UndeclaredDependency {
        table: String,
        column: String,
        target: String,
    },

    /// The registry file could not be read or parsed
    #[error("Failed to load registry: {0}")]
    Load(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for FerryError {
    fn from(err: std::io::Error) -> Self {
        FerryError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FerryError {
    fn from(err: serde_json::Error) -> Self {
        FerryError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FerryError {
    fn from(err: toml::de::Error) -> Self {
        FerryError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<sqlparser::parser::ParserError> for FerryError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        FerryError::Parse(err.to_string())
    }
}

impl From<zip::result::ZipError> for FerryError {
    fn from(err: zip::result::ZipError) -> Self {
        FerryError::Archive(err.to_string())
    }
}
