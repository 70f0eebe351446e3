//! Backend adapters: row REST endpoint and object storage
//!
//! ```rust,no_run
//! use ferry::adapters::backend::{BackendClient, RestRowSource, RowSource};
//! use ferry::config::load_config;
//! use ferry::domain::TableName;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ferry.toml")?;
//! let backend = config.require_backend()?;
//! let rows = RestRowSource::new(BackendClient::new(backend)?, backend.schema.clone());
//! let total = rows.count_rows(&TableName::new("patients")?).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod rest;
pub mod storage;
pub mod traits;

pub use client::BackendClient;
pub use rest::RestRowSource;
pub use storage::StorageApi;
pub use traits::{ObjectStore, RowSource, StorageEntry};
