//! Centralized identifier validation and quoting.
//!
//! SQL identifiers cannot be passed as bound parameters, so every
//! dynamically selected table/column name flows through these functions
//! before it is embedded in DDL or trigger bodies. This keeps escaping in
//! one well-tested place instead of scattered format! calls.

use crate::error::{Result, SetupError};

/// Maximum identifier length accepted by MariaDB. Derived trigger names
/// (`{table}_{event}_trigger`) pass through the same check at synthesis
/// time, so a table name that pushes the derived name past the cap fails
/// before any DDL is sent.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier for suspicious content.
///
/// Rejects empty names, names containing null bytes, and names exceeding
/// the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SetupError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(SetupError::Config(format!(
            "Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SetupError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a MariaDB identifier using backticks.
///
/// Escapes backticks by doubling them and wraps in backticks.
pub fn quote_mariadb(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Qualify a MariaDB table name with its database.
///
/// Returns `database`.`table` with proper quoting.
pub fn qualify_mariadb(database: &str, table: &str) -> Result<String> {
    Ok(format!(
        "{}.{}",
        quote_mariadb(database)?,
        quote_mariadb(table)?
    ))
}

/// Validate a CQL identifier.
///
/// The storage bridge resolves ScyllaDB keyspace/table names unquoted, so
/// names outside the unquoted-identifier grammar cannot round-trip and are
/// rejected outright rather than quoted.
pub fn validate_cql_identifier(name: &str) -> Result<()> {
    validate_identifier(name)?;

    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let tail_ok = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !head_ok || !tail_ok {
        return Err(SetupError::Config(format!(
            "Name {:?} is not a valid unquoted CQL identifier \
             (must match [A-Za-z_][A-Za-z0-9_]*)",
            name
        )));
    }

    Ok(())
}

/// Escape a string for embedding as a single-quoted SQL literal.
///
/// Doubles single quotes. Used for audit-row values and SIGNAL message
/// text inside generated trigger bodies.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
