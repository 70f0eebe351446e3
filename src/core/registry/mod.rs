//! Schema registry: the declared tables, their import order and their
//! foreign-key edges
//!
//! The registry is built once at startup and shared by reference
//! (`Arc<SchemaRegistry>`). Construction is the only place the dependency
//! graph is checked; every later lookup can assume it is consistent.
//!
//! ```rust
//! use ferry::core::registry::SchemaRegistry;
//!
//! let registry = SchemaRegistry::clinical().unwrap();
//! let rooms = registry.get("rooms").unwrap();
//! let branches = registry.get("branches").unwrap();
//! assert!(branches.order < rooms.order);
//! assert!(rooms.dependencies.contains("branches"));
//! ```

mod catalog;
mod file;

use crate::domain::{RegistryError, TableName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

/// Target marker for columns that reference the identity provider's users
pub const EXTERNAL_IDENTITY: &str = "EXTERNAL_IDENTITY";

/// Functional area a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableCategory {
    Organization,
    Catalog,
    Staff,
    Patients,
    Clinical,
    Scheduling,
    Billing,
    Crm,
    System,
}

impl fmt::Display for TableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableCategory::Organization => "organization",
            TableCategory::Catalog => "catalog",
            TableCategory::Staff => "staff",
            TableCategory::Patients => "patients",
            TableCategory::Clinical => "clinical",
            TableCategory::Scheduling => "scheduling",
            TableCategory::Billing => "billing",
            TableCategory::Crm => "crm",
            TableCategory::System => "system",
        };
        f.write_str(name)
    }
}

/// One table of the migrated schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    pub name: TableName,
    /// Human-readable label used in manifests
    pub label: String,
    pub category: TableCategory,
    /// Position in the import order (1-based, unique)
    pub order: u32,
    /// Tables that must be imported before this one
    pub dependencies: BTreeSet<TableName>,
}

/// Where a foreign-key column points
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FkTarget {
    /// A column of another (or the same) table
    Table { table: TableName, column: String },
    /// A user of the external identity provider, never present in the export
    ExternalIdentity,
}

impl fmt::Display for FkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FkTarget::Table { table, column } => write!(f, "{table}.{column}"),
            FkTarget::ExternalIdentity => f.write_str(EXTERNAL_IDENTITY),
        }
    }
}

/// A declared foreign-key column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyEdge {
    pub source_table: TableName,
    pub source_column: String,
    pub target: FkTarget,
    pub nullable: bool,
}

impl ForeignKeyEdge {
    /// Edge to `target_table.column`
    pub fn to_table(
        source_table: TableName,
        source_column: impl Into<String>,
        target_table: TableName,
        target_column: impl Into<String>,
        nullable: bool,
    ) -> Self {
        Self {
            source_table,
            source_column: source_column.into(),
            target: FkTarget::Table {
                table: target_table,
                column: target_column.into(),
            },
            nullable,
        }
    }

    /// Edge to an external identity
    pub fn to_external(
        source_table: TableName,
        source_column: impl Into<String>,
        nullable: bool,
    ) -> Self {
        Self {
            source_table,
            source_column: source_column.into(),
            target: FkTarget::ExternalIdentity,
            nullable,
        }
    }

    pub fn is_external_identity(&self) -> bool {
        matches!(self.target, FkTarget::ExternalIdentity)
    }
}

/// Immutable, validated table catalog
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    /// Sorted by `order`
    tables: Vec<TableDefinition>,
    index: HashMap<TableName, usize>,
    edges: BTreeMap<TableName, Vec<ForeignKeyEdge>>,
}

impl SchemaRegistry {
    /// Build a registry, rejecting any inconsistency in the declared graph
    ///
    /// # Errors
    ///
    /// - duplicate table names or order positions
    /// - a registered dependency whose order is not strictly earlier
    /// - an edge from an unregistered table
    /// - an edge to a registered table (other than itself) that is not a
    ///   declared dependency of its source
    pub fn new(
        mut tables: Vec<TableDefinition>,
        edges: Vec<ForeignKeyEdge>,
    ) -> Result<Self, RegistryError> {
        tables.sort_by_key(|t| t.order);

        let mut index = HashMap::with_capacity(tables.len());
        for (position, table) in tables.iter().enumerate() {
            if index.insert(table.name.clone(), position).is_some() {
                return Err(RegistryError::DuplicateTable(table.name.to_string()));
            }
            if position > 0 && tables[position - 1].order == table.order {
                return Err(RegistryError::DuplicateOrder {
                    order: table.order,
                    first: tables[position - 1].name.to_string(),
                    second: table.name.to_string(),
                });
            }
        }

        for table in &tables {
            for dependency in &table.dependencies {
                // Dependencies outside the registry are not checked
                let Some(&position) = index.get(dependency) else {
                    continue;
                };
                let dependency_order = tables[position].order;
                if dependency_order >= table.order {
                    return Err(RegistryError::OrderViolation {
                        table: table.name.to_string(),
                        table_order: table.order,
                        dependency: dependency.to_string(),
                        dependency_order,
                    });
                }
            }
        }

        let mut by_table: BTreeMap<TableName, Vec<ForeignKeyEdge>> = BTreeMap::new();
        for edge in edges {
            let Some(&position) = index.get(&edge.source_table) else {
                return Err(RegistryError::UnknownEdgeSource {
                    table: edge.source_table.to_string(),
                    column: edge.source_column,
                });
            };
            if let FkTarget::Table { table: target, .. } = &edge.target {
                let source = &tables[position];
                if *target != source.name
                    && index.contains_key(target)
                    && !source.dependencies.contains(target)
                {
                    return Err(RegistryError::UndeclaredDependency {
                        table: edge.source_table.to_string(),
                        column: edge.source_column,
                        target: target.to_string(),
                    });
                }
            }
            by_table.entry(edge.source_table.clone()).or_default().push(edge);
        }

        Ok(Self {
            tables,
            index,
            edges: by_table,
        })
    }

    /// The built-in catalog of the clinical-records schema
    pub fn clinical() -> Result<Self, RegistryError> {
        catalog::clinical_registry()
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, RegistryError> {
        file::parse_registry(contents)
    }

    /// Load a registry from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Tables in import order
    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&TableDefinition> {
        self.index.get(name).map(|&position| &self.tables[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn dependencies_of(&self, name: &str) -> Option<&BTreeSet<TableName>> {
        self.get(name).map(|t| &t.dependencies)
    }

    pub fn order_of(&self, name: &str) -> Option<u32> {
        self.get(name).map(|t| t.order)
    }

    /// Foreign-key edges whose source is `name`, in declaration order
    pub fn edges_of(&self, name: &str) -> &[ForeignKeyEdge] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges, grouped by source table in import order
    pub fn edges(&self) -> impl Iterator<Item = &ForeignKeyEdge> {
        self.tables
            .iter()
            .flat_map(move |table| self.edges_of(table.name.as_str()).iter())
    }

    /// Edges that point at the external identity provider, in import order
    pub fn external_identity_edges(&self) -> Vec<&ForeignKeyEdge> {
        self.edges().filter(|e| e.is_external_identity()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Width of the zero-padded order prefix used in archive file names
    pub fn order_width(&self) -> usize {
        let max = self.tables.last().map(|t| t.order).unwrap_or(0);
        max.to_string().len().max(2)
    }
}
