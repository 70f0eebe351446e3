//! Schema command implementation
//!
//! Prints the import order with each table's dependencies and foreign keys,
//! or with `--check` only verifies that the registry is consistent.

use super::{load_registry, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::load_config_or_default;
use crate::core::registry::SchemaRegistry;
use clap::Args;
use std::fmt::Write as _;

/// Arguments for the schema command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Only validate the registry
    #[arg(long)]
    pub check: bool,
}

impl SchemaArgs {
    /// Execute the schema command
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
                println!("❌ Schema registry is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if self.check {
            println!(
                "✅ Schema registry is valid: {} tables, {} foreign keys, {} external identity references",
                registry.len(),
                registry.edges().count(),
                registry.external_identity_edges().len()
            );
        } else {
            print!("{}", render_import_order(&registry));
        }
        Ok(EXIT_SUCCESS)
    }
}

/// One block per table in import order
pub fn render_import_order(registry: &SchemaRegistry) -> String {
    let width = registry.order_width();
    let mut out = String::new();

    let _ = writeln!(out, "Import order ({} tables)", registry.len());
    out.push('\n');
    for table in registry.tables() {
        let deps = if table.dependencies.is_empty() {
            "-".to_string()
        } else {
            table
                .dependencies
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            out,
            "{:0width$}. {} ({}) [{}]",
            table.order, table.name, table.label, table.category
        );
        let _ = writeln!(out, "    Deps: {deps}");
        for edge in registry.edges_of(table.name.as_str()) {
            let _ = writeln!(
                out,
                "    {} -> {}{}",
                edge.source_column,
                edge.target,
                if edge.nullable { "" } else { " (required)" }
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_import_order() {
        let registry = SchemaRegistry::clinical().unwrap();
        let text = render_import_order(&registry);

        assert!(text.starts_with("Import order (45 tables)\n"));
        assert!(text.contains("01. organizations (Organizaciones) [organization]\n    Deps: -\n"));
        assert!(text.contains("    branch_id -> branches.id (required)"));
        assert!(text.contains("    owner_id -> EXTERNAL_IDENTITY"));
    }

    #[tokio::test]
    async fn test_broken_registry_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry_path = dir.path().join("registry.toml");
        std::fs::write(
            &registry_path,
            "[[tables]]\nname = \"rooms\"\ncategory = \"organization\"\norder = 1\ndependencies = [\"branches\"]\n\n\
             [[tables]]\nname = \"branches\"\ncategory = \"organization\"\norder = 2\n",
        )
        .unwrap();
        let config_path = dir.path().join("ferry.toml");
        std::fs::write(
            &config_path,
            format!("[registry]\npath = \"{}\"\n", registry_path.display()),
        )
        .unwrap();

        let args = SchemaArgs { check: true };
        assert_eq!(args.execute(config_path.to_str().unwrap()).await.unwrap(), EXIT_CONFIG);
    }
}
