//! Domain identifier types with validation
//!
//! Table names are resolved once, when the schema registry is built, and
//! passed around as [`TableName`] afterwards.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Relational table identifier
///
/// Lowercase ASCII letters, digits and underscores, not starting with a digit.
/// This is the same shape the row API accepts as a path segment, so a valid
/// `TableName` never needs escaping.
///
/// # Examples
///
/// ```
/// use ferry::domain::ids::TableName;
/// use std::str::FromStr;
///
/// let table = TableName::from_str("patient_contacts").unwrap();
/// assert_eq!(table.as_str(), "patient_contacts");
/// assert!(TableName::new("Patients").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Creates a new TableName, validating its format
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() {
            return Err("Table name cannot be empty".to_string());
        }

        let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if starts_with_digit || !valid_chars {
            return Err(format!(
                "Invalid table name '{name}': expected lowercase letters, digits and underscores"
            ));
        }

        Ok(Self(name))
    }

    /// Returns the table name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_table_name_valid() {
        let name = TableName::new("lab_order_items").unwrap();
        assert_eq!(name.as_str(), "lab_order_items");
        assert_eq!(name.to_string(), "lab_order_items");
    }

    #[test]
    fn test_table_name_rejects_bad_input() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("Patients").is_err());
        assert!(TableName::new("2fa_codes").is_err());
        assert!(TableName::new("public.patients").is_err());
        assert!(TableName::new("drop table;").is_err());
    }

    #[test]
    fn test_table_name_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(TableName::new("rooms").unwrap(), 5);
        assert_eq!(map.get("rooms"), Some(&5));
    }

    #[test]
    fn test_table_name_serde() {
        let name: TableName = serde_json::from_str("\"branches\"").unwrap();
        assert_eq!(name.as_str(), "branches");
        assert!(serde_json::from_str::<TableName>("\"Bad Name\"").is_err());
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"branches\"");
    }
}
