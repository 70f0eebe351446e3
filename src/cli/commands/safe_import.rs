//! Safe-import-script command implementation

use super::{load_registry, target_schema, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::load_config_or_default;
use crate::core::export::ExportFormat;
use crate::core::report::SafeImportScript;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the safe-import-script command
#[derive(Args, Debug)]
pub struct SafeImportArgs {
    /// Write the script to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Data file format to load (csv or sql); defaults to `[export] format`
    #[arg(long)]
    pub format: Option<String>,
}

impl SafeImportArgs {
    /// Execute the safe-import-script command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let registry = match load_registry(&config) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let format: ExportFormat = match self
            .format
            .as_deref()
            .unwrap_or(&config.export.format)
            .parse()
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let script = SafeImportScript::new(&registry, target_schema(&config), format).render(None);
        match &self.output {
            Some(path) => {
                std::fs::write(path, script)?;
                println!("📝 Safe-import script written to {}", path.display());
            }
            None => print!("{script}"),
        }
        Ok(EXIT_SUCCESS)
    }
}
