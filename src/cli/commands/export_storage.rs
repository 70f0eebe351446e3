//! Export-storage command implementation
//!
//! Downloads every object under a bucket prefix into one zip archive with
//! `_MANIFEST.txt` and, when anything failed, `_ERRORS.txt`.

use super::{
    exit_code_for, EXIT_CONFIG, EXIT_CONNECTION, EXIT_INTERRUPTED, EXIT_PARTIAL, EXIT_SUCCESS,
};
use crate::adapters::backend::{BackendClient, StorageApi};
use crate::config::{load_config, StorageConfig};
use crate::core::progress::TracingProgress;
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownSignal;
use crate::core::storage::{ObjectStoreExporter, StorageExportOptions, DEFAULT_BATCH_WIDTH};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export-storage command
#[derive(Args, Debug)]
pub struct ExportStorageArgs {
    /// Bucket to export (overrides `[storage] bucket`)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Folder prefix inside the bucket
    #[arg(long)]
    pub prefix: Option<String>,

    /// Directory for the archive
    #[arg(short, long)]
    pub output: Option<String>,
}

impl ExportStorageArgs {
    /// Execute the export-storage command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting storage export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if config.storage.is_none() {
            if let Some(bucket) = &self.bucket {
                config.storage = Some(StorageConfig {
                    bucket: bucket.clone(),
                    prefix: String::new(),
                    batch_width: DEFAULT_BATCH_WIDTH,
                    list_page_size: 1000,
                    output_dir: config.export.output_dir.clone(),
                });
            }
        }
        if let Some(storage) = config.storage.as_mut() {
            if let Some(bucket) = &self.bucket {
                storage.bucket = bucket.clone();
            }
            if let Some(prefix) = &self.prefix {
                storage.prefix = prefix.clone();
            }
            if let Some(output) = &self.output {
                storage.output_dir = output.clone();
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }
        let (backend, storage) = match (config.require_backend(), config.require_storage()) {
            (Ok(b), Ok(s)) => (b.clone(), s.clone()),
            (Err(e), _) | (_, Err(e)) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let client = match BackendClient::new(&backend) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create backend client");
                eprintln!("Failed to initialize export: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let mut exporter = ObjectStoreExporter::new(
            Arc::new(StorageApi::new(client, &storage.bucket)),
            StorageExportOptions::from_config(&storage),
            RetryPolicy::from_config(&backend.retry),
            ShutdownSignal::new(shutdown_signal),
            Arc::new(TracingProgress),
        );

        println!("🚀 Exporting bucket '{}'...", storage.bucket);
        println!();

        let report = match exporter.execute().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Storage export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!("📊 Storage Export Summary:");
        println!("  Objects listed: {}", report.objects_listed);
        println!("  Downloaded: {}", report.succeeded());
        println!("  Failed: {}", report.failed());
        println!("  Folders failed: {}", report.folder_errors.len());
        println!("  Not attempted: {}", report.not_attempted());
        println!("  Bytes: {}", report.total_bytes());
        if let Some(path) = &report.archive_path {
            println!("  Archive: {}", path.display());
        }
        println!();

        let exit_code = if report.interrupted {
            println!("⚠️  Export interrupted. The archive holds the objects downloaded so far.");
            EXIT_INTERRUPTED
        } else if report.is_successful() {
            println!("✅ Storage export completed successfully!");
            EXIT_SUCCESS
        } else {
            println!("⚠️  Storage export completed with failures (see _ERRORS.txt)");
            EXIT_PARTIAL
        };

        Ok(exit_code)
    }
}
