//! Integration tests for the table registry

use ferry::core::registry::{FkTarget, SchemaRegistry, EXTERNAL_IDENTITY};
use ferry::domain::RegistryError;
use std::io::Write;
use tempfile::NamedTempFile;

const REGISTRY: &str = r#"
[[tables]]
name = "branches"
label = "Sucursales"
category = "organization"
order = 1

[[tables]]
name = "rooms"
label = "Consultorios"
category = "organization"
order = 2
dependencies = ["branches"]
foreign_keys = [
    { column = "branch_id", references = "branches.id", nullable = false },
    { column = "created_by", references = "EXTERNAL_IDENTITY" },
]
"#;

#[test]
fn test_clinical_catalog_is_consistent() {
    let registry = SchemaRegistry::clinical().unwrap();

    assert_eq!(registry.len(), 45);
    assert_eq!(registry.order_of("organizations"), Some(1));
    assert_eq!(registry.order_of("branches"), Some(2));
    assert_eq!(registry.order_of("rooms"), Some(3));

    let orders: Vec<u32> = registry.tables().iter().map(|t| t.order).collect();
    let expected: Vec<u32> = (1..=45).collect();
    assert_eq!(orders, expected);

    // Every registered target loads before its source (self-references aside)
    for edge in registry.edges() {
        if let FkTarget::Table { table, .. } = &edge.target {
            if table != &edge.source_table {
                if let Some(target_order) = registry.order_of(table.as_str()) {
                    let source_order = registry.order_of(edge.source_table.as_str()).unwrap();
                    assert!(target_order < source_order, "{} -> {}", edge.source_table, table);
                }
            }
        }
    }

    assert!(registry
        .external_identity_edges()
        .iter()
        .any(|e| e.source_table.as_str() == "organizations" && e.source_column == "owner_id"));
}

#[test]
fn test_registry_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(REGISTRY.as_bytes()).unwrap();
    file.flush().unwrap();

    let registry = SchemaRegistry::from_file(file.path()).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("rooms").unwrap().label, "Consultorios");
    assert!(registry.dependencies_of("rooms").unwrap().iter().any(|d| d.as_str() == "branches"));

    let edges = registry.edges_of("rooms");
    assert_eq!(edges.len(), 2);
    assert!(!edges[0].nullable);
    assert_eq!(edges[0].target.to_string(), "branches.id");
    assert_eq!(edges[1].target.to_string(), EXTERNAL_IDENTITY);
}

#[test]
fn test_dependency_must_load_first() {
    let contents = REGISTRY.replace("order = 2", "order = 0");
    let err = SchemaRegistry::from_toml_str(&contents).unwrap_err();
    assert!(matches!(err, RegistryError::OrderViolation { .. }));
}

#[test]
fn test_undeclared_dependency_rejected() {
    let contents = REGISTRY.replace("dependencies = [\"branches\"]\n", "");
    let err = SchemaRegistry::from_toml_str(&contents).unwrap_err();
    assert!(matches!(err, RegistryError::UndeclaredDependency { .. }));
}

#[test]
fn test_duplicate_order_rejected() {
    let contents = REGISTRY.replace("order = 2", "order = 1");
    assert!(SchemaRegistry::from_toml_str(&contents).is_err());
}

#[test]
fn test_missing_registry_file() {
    let err = SchemaRegistry::from_file("no-such-registry.toml").unwrap_err();
    assert!(matches!(err, RegistryError::Load(_)));
}
