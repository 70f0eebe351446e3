//! SQL template for loading an export with constraints relaxed
//!
//! The script disables triggers and defers constraint checks, loads the
//! data files in import order, and leaves one placeholder `UPDATE` per
//! external-identity column for remapping user ids on the destination.

use crate::core::export::{ArchiveBuilder, ExportFormat};
use crate::core::export::serialize::quote_identifier;
use crate::core::registry::SchemaRegistry;
use crate::core::validation::ValidationRun;
use std::fmt::Write as _;

/// Builds the safe-import script from the registry
pub struct SafeImportScript<'a> {
    registry: &'a SchemaRegistry,
    schema: String,
    format: ExportFormat,
}

impl<'a> SafeImportScript<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        schema: impl Into<String>,
        format: ExportFormat,
    ) -> Self {
        Self {
            registry,
            schema: schema.into(),
            format,
        }
    }

    /// Render the script; a validation run adds reference counts per column
    pub fn render(&self, run: Option<&ValidationRun>) -> String {
        let mut out = String::new();
        self.write_preamble(&mut out);
        self.write_load_order(&mut out);
        self.write_identity_updates(&mut out, run);
        self.write_postamble(&mut out);
        out
    }

    fn write_preamble(&self, out: &mut String) {
        let _ = writeln!(out, "-- Ferry safe import script");
        let _ = writeln!(out, "-- Generated: {}", chrono::Utc::now().to_rfc3339());
        let _ = writeln!(out, "-- Run as a role allowed to set session_replication_role.");
        out.push('\n');
        let _ = writeln!(out, "BEGIN;");
        let _ = writeln!(out, "SET session_replication_role = replica;");
        let _ = writeln!(out, "SET CONSTRAINTS ALL DEFERRED;");
        out.push('\n');
    }

    fn write_load_order(&self, out: &mut String) {
        let files = ArchiveBuilder::new(self.registry, self.format, &self.schema);
        let _ = writeln!(out, "-- Load data files in import order");
        for table in self.registry.tables() {
            let file = files.file_name(table);
            match self.format {
                ExportFormat::Sql => {
                    let _ = writeln!(out, "\\i {file}");
                }
                ExportFormat::Csv => {
                    let _ = writeln!(
                        out,
                        "\\copy {}.{} FROM '{file}' WITH (FORMAT csv, HEADER true)",
                        quote_identifier(&self.schema),
                        quote_identifier(table.name.as_str())
                    );
                }
            }
        }
        out.push('\n');
    }

    fn write_identity_updates(&self, out: &mut String, run: Option<&ValidationRun>) {
        let edges = self.registry.external_identity_edges();

        let _ = writeln!(out, "-- Remap external identity references ({} columns)", edges.len());
        let _ = writeln!(out, "-- Replace OLD_ID / NEW_ID with the user ids of the destination.");
        for edge in edges {
            let table = edge.source_table.as_str();
            let column = edge.source_column.as_str();
            if let Some(run) = run {
                let n = external_reference_count(run, table, column);
                let _ = writeln!(
                    out,
                    "-- {table}.{column}: {n} row(s) reference an external identity"
                );
            }
            let _ = writeln!(
                out,
                "UPDATE {}.{} SET {col} = 'NEW_ID' WHERE {col} = 'OLD_ID';",
                quote_identifier(&self.schema),
                quote_identifier(table),
                col = quote_identifier(column)
            );
        }
        out.push('\n');
    }

    fn write_postamble(&self, out: &mut String) {
        let _ = writeln!(out, "SET session_replication_role = DEFAULT;");
        let _ = writeln!(out, "COMMIT;");
    }
}

fn external_reference_count(run: &ValidationRun, table: &str, column: &str) -> usize {
    run.get(table).map_or(0, |result| {
        result
            .external_refs
            .iter()
            .filter(|r| r.column == column)
            .count()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::{ExternalRef, ValidationResult};

    #[test]
    fn test_covers_every_external_identity_edge() {
        let registry = SchemaRegistry::clinical().unwrap();
        let script = SafeImportScript::new(&registry, "public", ExportFormat::Sql).render(None);

        for edge in registry.external_identity_edges() {
            let line = format!(
                "UPDATE public.{} SET {col} = 'NEW_ID' WHERE {col} = 'OLD_ID';",
                edge.source_table,
                col = edge.source_column
            );
            assert!(script.contains(&line), "missing {line}");
        }
        assert!(!script.contains("row(s) reference"));
    }

    #[test]
    fn test_preamble_load_order_postamble() {
        let registry = SchemaRegistry::clinical().unwrap();
        let script = SafeImportScript::new(&registry, "public", ExportFormat::Csv).render(None);

        let begin = script.find("BEGIN;").unwrap();
        let replica = script.find("SET session_replication_role = replica;").unwrap();
        let deferred = script.find("SET CONSTRAINTS ALL DEFERRED;").unwrap();
        let first_copy = script
            .find("\\copy public.organizations FROM '01_organizations.csv'")
            .unwrap();
        let restore = script.find("SET session_replication_role = DEFAULT;").unwrap();
        let commit = script.find("COMMIT;").unwrap();

        assert!(begin < replica && replica < deferred && deferred < first_copy);
        assert!(first_copy < restore && restore < commit);
    }

    #[test]
    fn test_counts_annotation() {
        let registry = SchemaRegistry::clinical().unwrap();
        let edge = registry.external_identity_edges()[0].clone();

        let source = edge.source_table.as_str();
        let mut result = ValidationResult::new(source, registry.order_of(source));
        for row_index in 0..3 {
            result.external_refs.push(ExternalRef {
                row_index,
                column: edge.source_column.clone(),
                value: format!("u{row_index}"),
            });
        }
        let run = ValidationRun::new(vec![result]);

        let script =
            SafeImportScript::new(&registry, "public", ExportFormat::Sql).render(Some(&run));
        assert!(script.contains(&format!(
            "-- {}.{}: 3 row(s) reference an external identity",
            edge.source_table, edge.source_column
        )));
    }
}
