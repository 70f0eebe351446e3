//! TOML registry files
//!
//! ```toml
//! [[tables]]
//! name = "branches"
//! label = "Sucursales"
//! category = "organization"
//! order = 1
//!
//! [[tables]]
//! name = "rooms"
//! label = "Consultorios"
//! category = "organization"
//! order = 2
//! dependencies = ["branches"]
//! foreign_keys = [
//!     { column = "branch_id", references = "branches.id", nullable = false },
//!     { column = "created_by", references = "EXTERNAL_IDENTITY" },
//! ]
//! ```
//!
//! A `references` value without a column (`"branches"`) targets `id`.

use super::{ForeignKeyEdge, SchemaRegistry, TableCategory, TableDefinition, EXTERNAL_IDENTITY};
use crate::domain::{RegistryError, TableName};
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableEntry {
    name: String,
    label: Option<String>,
    category: TableCategory,
    order: u32,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKeyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForeignKeyEntry {
    column: String,
    references: String,
    #[serde(default = "default_nullable")]
    nullable: bool,
}

fn default_nullable() -> bool {
    true
}

fn table_name(name: &str) -> Result<TableName, RegistryError> {
    TableName::new(name).map_err(RegistryError::InvalidTableName)
}

pub(super) fn parse_registry(contents: &str) -> Result<SchemaRegistry, RegistryError> {
    let file: RegistryFile =
        toml::from_str(contents).map_err(|e| RegistryError::Load(e.to_string()))?;

    let mut tables = Vec::with_capacity(file.tables.len());
    let mut edges = Vec::new();

    for entry in file.tables {
        let name = table_name(&entry.name)?;
        let dependencies = entry
            .dependencies
            .iter()
            .map(|d| table_name(d))
            .collect::<Result<BTreeSet<_>, _>>()?;

        for fk in entry.foreign_keys {
            let edge = if fk.references == EXTERNAL_IDENTITY {
                ForeignKeyEdge::to_external(name.clone(), fk.column, fk.nullable)
            } else {
                let (table, column) = fk
                    .references
                    .split_once('.')
                    .unwrap_or((fk.references.as_str(), "id"));
                if column.is_empty() {
                    return Err(RegistryError::Load(format!(
                        "{}.{}: empty target column in '{}'",
                        entry.name, fk.column, fk.references
                    )));
                }
                ForeignKeyEdge::to_table(
                    name.clone(),
                    fk.column,
                    table_name(table)?,
                    column,
                    fk.nullable,
                )
            };
            edges.push(edge);
        }

        tables.push(TableDefinition {
            label: entry.label.unwrap_or_else(|| entry.name.clone()),
            name,
            category: entry.category,
            order: entry.order,
            dependencies,
        });
    }

    SchemaRegistry::new(tables, edges)
}
