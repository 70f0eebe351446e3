//! Offline foreign-key validation of exported tables

use super::parser::ValidationInput;
use super::result::{ExternalRef, FkViolation, ValidationResult, ValidationRun};
use crate::core::registry::{FkTarget, SchemaRegistry};
use std::collections::{HashMap, HashSet};

/// Values that mean "no reference"
fn is_absent(value: &str) -> bool {
    value.is_empty() || value == "null" || value == "NULL"
}

/// How one foreign-key value resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Valid,
    /// Target loads later, is unregistered, or was not supplied
    Pending,
    /// Target loads earlier and was supplied, but the value is missing
    Invalid,
}

/// Target-column value sets, built once per run
struct ValueIndex<'a> {
    values: HashMap<&'a str, HashMap<&'a str, HashSet<&'a str>>>,
}

impl<'a> ValueIndex<'a> {
    fn build(registry: &'a SchemaRegistry, input: &'a ValidationInput) -> Self {
        let mut values: HashMap<&'a str, HashMap<&'a str, HashSet<&'a str>>> = HashMap::new();
        for edge in registry.edges() {
            let FkTarget::Table { table, column } = &edge.target else {
                continue;
            };
            let Some(parsed) = input.get(table.as_str()) else {
                continue;
            };
            let columns = values.entry(table.as_str()).or_default();
            if columns.contains_key(column.as_str()) {
                continue;
            }
            let set = parsed
                .rows
                .iter()
                .filter_map(|row| row.get(column.as_str()))
                .map(String::as_str)
                .filter(|v| !is_absent(v))
                .collect();
            columns.insert(column.as_str(), set);
        }
        Self { values }
    }

    fn contains(&self, table: &str, column: &str, value: &str) -> bool {
        self.values
            .get(table)
            .and_then(|columns| columns.get(column))
            .is_some_and(|set| set.contains(value))
    }
}

/// Classifies every foreign-key value of the supplied tables
///
/// A missing target value is **pending** when the target table loads at or
/// after the source table (or is unknown, or was not supplied), and
/// **invalid** when the target loads earlier and was supplied.
pub struct Validator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate every table in `input`
    ///
    /// Results follow import order; tables the registry does not know come
    /// last, with every row counted valid.
    pub fn validate(&self, input: &ValidationInput) -> ValidationRun {
        let index = ValueIndex::build(self.registry, input);

        let mut results: Vec<ValidationResult> = input
            .tables()
            .map(|(name, _)| self.validate_table(name, input, &index))
            .collect();
        results.sort_by_key(|r| (r.order.is_none(), r.order));

        let mut run = ValidationRun::new(results);
        run.file_errors = input.file_errors().to_vec();
        tracing::info!(
            tables = run.results.len(),
            unreadable_files = run.file_errors.len(),
            records = run.total_records(),
            pending = run.pending_records(),
            invalid = run.invalid_records(),
            external_refs = run.auth_user_refs(),
            "Validation complete"
        );
        run
    }

    fn validate_table(
        &self,
        name: &str,
        input: &ValidationInput,
        index: &ValueIndex<'_>,
    ) -> ValidationResult {
        let order = self.registry.order_of(name);
        let mut result = ValidationResult::new(name, order);
        let Some(table) = input.get(name) else {
            return result;
        };
        result.total_records = table.rows.len();

        if order.is_none() {
            tracing::warn!(table = name, "Table is not in the registry; foreign keys not checked");
        }
        let edges = self.registry.edges_of(name);

        for (row_index, row) in table.rows.iter().enumerate() {
            let mut row_clean = true;

            for edge in edges {
                let column = edge.source_column.as_str();
                let Some(value) = row
                    .get(column)
                    .map(String::as_str)
                    .filter(|v| !is_absent(v))
                else {
                    continue;
                };

                let (target_table, target_column) = match &edge.target {
                    FkTarget::ExternalIdentity => {
                        result.auth_user_refs += 1;
                        result.external_refs.push(ExternalRef {
                            row_index,
                            column: column.to_string(),
                            value: value.to_string(),
                        });
                        continue;
                    }
                    FkTarget::Table { table, column: target_column } => {
                        (table.as_str(), target_column.as_str())
                    }
                };

                let resolution =
                    self.resolve(order, target_table, target_column, value, input, index);
                let violation = || FkViolation {
                    row_index,
                    column: column.to_string(),
                    target_table: target_table.to_string(),
                    missing_value: value.to_string(),
                };
                match resolution {
                    Resolution::Valid => {}
                    Resolution::Pending => {
                        row_clean = false;
                        result.pending.push(violation());
                    }
                    Resolution::Invalid => {
                        row_clean = false;
                        result.invalid.push(violation());
                    }
                }
            }

            if row_clean {
                result.valid_records += 1;
            }
        }
        result.pending_records = result.pending.len();
        result.invalid_records = result.invalid.len();

        tracing::debug!(
            table = name,
            total = result.total_records,
            valid = result.valid_records,
            pending = result.pending_records,
            invalid = result.invalid_records,
            "Table validated"
        );
        result
    }

    fn resolve(
        &self,
        source_order: Option<u32>,
        target_table: &str,
        target_column: &str,
        value: &str,
        input: &ValidationInput,
        index: &ValueIndex<'_>,
    ) -> Resolution {
        if !input.contains(target_table) {
            return Resolution::Pending;
        }
        if index.contains(target_table, target_column, value) {
            return Resolution::Valid;
        }
        match (self.registry.order_of(target_table), source_order) {
            (Some(target), Some(source)) if target < source => Resolution::Invalid,
            _ => Resolution::Pending,
        }
    }
}
