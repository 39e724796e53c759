//! Schema metadata types for source tables and columns.
//!
//! These types are produced by catalog introspection and are immutable for
//! the duration of a setup run. Nothing is cached across runs.

use serde::{Deserialize, Serialize};

/// Table name prefix reserved for internal objects (audit log, staging).
/// Tables matching this prefix are invisible to introspection and mirroring.
pub const RESERVED_PREFIX: &str = "_";

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Schema (database) name.
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Column definitions in catalog ordinal order.
    pub columns: Vec<Column>,

    /// Primary key column names in constraint order.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Get the fully qualified table name (unquoted, for display).
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Check if the table has a primary key.
    ///
    /// Tables without one cannot be mirrored: the target store requires a
    /// partition key, and the triggers need a key to address mirror rows.
    pub fn has_pk(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// The partition key column: the first primary-key column in catalog
    /// order. Composite partition keys are not supported.
    pub fn partition_key(&self) -> Option<&str> {
        self.primary_key.first().map(String::as_str)
    }

    /// Ordered column names.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Whether the name falls under the reserved internal prefix.
    pub fn is_reserved_name(name: &str) -> bool {
        name.starts_with(RESERVED_PREFIX)
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Base data type token (e.g. "int", "varchar", "binary").
    pub data_type: String,

    /// Full declared type (e.g. "varchar(100)", "binary(16)"), used verbatim
    /// for the storage-bridge table on the MariaDB side.
    pub column_type: String,

    /// Declared length for character/binary types, if any.
    pub max_length: Option<i64>,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(pk: Vec<&str>) -> Table {
        Table {
            schema: "testdb".to_string(),
            name: "orders".to_string(),
            columns: vec![],
            primary_key: pk.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(make_table(vec!["id"]).full_name(), "testdb.orders");
    }

    #[test]
    fn test_partition_key_is_first_pk_column() {
        let table = make_table(vec!["region", "id"]);
        assert_eq!(table.partition_key(), Some("region"));
    }

    #[test]
    fn test_no_pk_means_no_partition_key() {
        let table = make_table(vec![]);
        assert!(!table.has_pk());
        assert_eq!(table.partition_key(), None);
    }

    #[test]
    fn test_reserved_prefix() {
        assert!(Table::is_reserved_name("_mirror_trigger_audit"));
        assert!(Table::is_reserved_name("_staging"));
        assert!(!Table::is_reserved_name("users"));
    }
}
