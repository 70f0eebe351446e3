// Ferry - Clinical Records Migration Export & Validation
// Copyright (c) 2026 Ferry Contributors
// Licensed under the MIT License

//! # Ferry - Migration Export & Validation Engine
//!
//! Ferry moves a clinical-records backend to a new home. It exports every
//! table of the source schema in dependency order, downloads the patient
//! file store, and validates the export offline before anything is
//! imported.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Exporting** tables page by page into an import-ordered zip of CSV or SQL files
//! - **Downloading** object storage in bounded concurrent batches with retries
//! - **Validating** foreign keys of an export without touching the backend
//! - **Reporting** findings and generating a safe-import SQL template
//!
//! ## Architecture
//!
//! Ferry follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (registry, export, storage, validation, report)
//! - [`adapters`] - Backend integrations (REST row API, object storage)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferry::adapters::backend::{BackendClient, RestRowSource};
//! use ferry::config::load_config;
//! use ferry::core::export::{ExportCoordinator, ExportOptions};
//! use ferry::core::progress::TracingProgress;
//! use ferry::core::registry::SchemaRegistry;
//! use ferry::core::retry::RetryPolicy;
//! use ferry::core::shutdown::ShutdownSignal;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ferry.toml")?;
//!     let backend = config.require_backend()?;
//!
//!     let coordinator = ExportCoordinator::new(
//!         Arc::new(SchemaRegistry::clinical()?),
//!         Arc::new(RestRowSource::new(BackendClient::new(backend)?, &backend.schema)),
//!         ExportOptions::from_config(&config.export, &backend.schema)?,
//!         RetryPolicy::from_config(&backend.retry),
//!         ShutdownSignal::never(),
//!         Arc::new(TracingProgress),
//!     );
//!
//!     let summary = coordinator.execute_export().await?;
//!     println!("Exported {} rows", summary.total_rows());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::FerryError`]; only CLI handlers use `anyhow`.
//!
//! ```rust,no_run
//! use ferry::domain::FerryError;
//!
//! fn example() -> Result<(), FerryError> {
//!     let registry = ferry::core::registry::SchemaRegistry::from_file("registry.toml")?;
//!     println!("{} tables", registry.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
