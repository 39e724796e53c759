//! MariaDB to CQL type mapping.
//!
//! The mapping is a total function over the supported MariaDB type
//! vocabulary; anything outside it is rejected at synthesis time with
//! [`SetupError::UnsupportedType`] rather than surfacing as a runtime
//! failure inside a trigger.
//!
//! One override rule runs before the generic table: a fixed-length
//! `binary(16)` or `char(36)` column is treated as a UUID. MariaDB has no
//! native uuid type, so those two conventional encodings are how a ScyllaDB
//! `uuid` is represented on the relational side.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::schema::Column;
use crate::error::{Result, SetupError};

/// Target (CQL) column type.
///
/// A closed set: every mirror column is one of these, decided during
/// synthesis. Rendering to DDL text goes through [`CqlType::cql_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CqlType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Text,
    Blob,
    Uuid,
    Date,
    Time,
    Timestamp,
}

impl CqlType {
    /// The CQL type token used in DDL.
    pub fn cql_name(&self) -> &'static str {
        match self {
            CqlType::TinyInt => "tinyint",
            CqlType::SmallInt => "smallint",
            CqlType::Int => "int",
            CqlType::BigInt => "bigint",
            CqlType::Float => "float",
            CqlType::Double => "double",
            CqlType::Decimal => "decimal",
            CqlType::Text => "text",
            CqlType::Blob => "blob",
            CqlType::Uuid => "uuid",
            CqlType::Date => "date",
            CqlType::Time => "time",
            CqlType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cql_name())
    }
}

/// Byte length of a `binary` column that encodes a UUID.
const UUID_BINARY_LENGTH: i64 = 16;

/// Character length of a `char` column that encodes a UUID in text form.
const UUID_CHAR_LENGTH: i64 = 36;

/// Map a MariaDB base type (plus declared length) to a CQL type.
///
/// Returns `None` for types outside the supported vocabulary.
pub fn map_type(data_type: &str, max_length: Option<i64>) -> Option<CqlType> {
    let base = data_type.to_lowercase();

    // UUID override: checked before the generic table.
    match (base.as_str(), max_length) {
        ("binary", Some(UUID_BINARY_LENGTH)) => return Some(CqlType::Uuid),
        ("char", Some(UUID_CHAR_LENGTH)) => return Some(CqlType::Uuid),
        _ => {}
    }

    let mapped = match base.as_str() {
        "tinyint" => CqlType::TinyInt,
        "smallint" => CqlType::SmallInt,
        "mediumint" | "int" | "integer" => CqlType::Int,
        "bigint" => CqlType::BigInt,
        "float" => CqlType::Float,
        "double" | "real" => CqlType::Double,
        "decimal" | "numeric" => CqlType::Decimal,
        "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" => CqlType::Text,
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => CqlType::Blob,
        "date" => CqlType::Date,
        "time" => CqlType::Time,
        "datetime" | "timestamp" => CqlType::Timestamp,
        _ => return None,
    };

    Some(mapped)
}

/// Map a column, producing an [`SetupError::UnsupportedType`] naming the
/// offending column and table when no mapping exists.
pub fn map_column(table: &str, col: &Column) -> Result<CqlType> {
    map_type(&col.data_type, col.max_length)
        .ok_or_else(|| SetupError::unsupported_type(table, &col.name, &col.data_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, data_type: &str, max_length: Option<i64>) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            column_type: data_type.to_string(),
            max_length,
            is_nullable: true,
            ordinal_pos: 1,
        }
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(map_type("tinyint", None), Some(CqlType::TinyInt));
        assert_eq!(map_type("smallint", None), Some(CqlType::SmallInt));
        assert_eq!(map_type("mediumint", None), Some(CqlType::Int));
        assert_eq!(map_type("int", None), Some(CqlType::Int));
        assert_eq!(map_type("bigint", None), Some(CqlType::BigInt));
    }

    #[test]
    fn test_floating_and_decimal() {
        assert_eq!(map_type("float", None), Some(CqlType::Float));
        assert_eq!(map_type("double", None), Some(CqlType::Double));
        assert_eq!(map_type("decimal", Some(10)), Some(CqlType::Decimal));
    }

    #[test]
    fn test_text_and_blob_families() {
        assert_eq!(map_type("varchar", Some(100)), Some(CqlType::Text));
        assert_eq!(map_type("longtext", None), Some(CqlType::Text));
        assert_eq!(map_type("varbinary", Some(64)), Some(CqlType::Blob));
        assert_eq!(map_type("mediumblob", None), Some(CqlType::Blob));
    }

    #[test]
    fn test_temporal_types() {
        assert_eq!(map_type("date", None), Some(CqlType::Date));
        assert_eq!(map_type("time", None), Some(CqlType::Time));
        assert_eq!(map_type("datetime", None), Some(CqlType::Timestamp));
        assert_eq!(map_type("timestamp", None), Some(CqlType::Timestamp));
    }

    #[test]
    fn test_uuid_override() {
        // binary(16) and char(36) win over the generic blob/text mapping
        assert_eq!(map_type("binary", Some(16)), Some(CqlType::Uuid));
        assert_eq!(map_type("char", Some(36)), Some(CqlType::Uuid));
        assert_eq!(map_type("BINARY", Some(16)), Some(CqlType::Uuid));

        // other lengths fall through to the generic table
        assert_eq!(map_type("binary", Some(8)), Some(CqlType::Blob));
        assert_eq!(map_type("char", Some(10)), Some(CqlType::Text));
        // varchar(36) is not the fixed-length convention
        assert_eq!(map_type("varchar", Some(36)), Some(CqlType::Text));
    }

    #[test]
    fn test_unknown_type_is_none() {
        assert_eq!(map_type("geometry", None), None);
        assert_eq!(map_type("set", None), None);
        assert_eq!(map_type("json", None), None);
    }

    #[test]
    fn test_map_column_error_names_table_and_column() {
        let err = map_column("orders", &col("shape", "geometry", None)).unwrap_err();
        match err {
            SetupError::UnsupportedType {
                table,
                column,
                data_type,
            } => {
                assert_eq!(table, "orders");
                assert_eq!(column, "shape");
                assert_eq!(data_type, "geometry");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display_renders_cql_token() {
        assert_eq!(CqlType::Uuid.to_string(), "uuid");
        assert_eq!(CqlType::Timestamp.to_string(), "timestamp");
    }
}
