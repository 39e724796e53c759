//! Mirror table synthesis.
//!
//! A [`MirrorTableSpec`] is the translated shape of one source table: its
//! column list with CQL types, the partition key, and the storage-bridge
//! connection parameters. It renders two DDL statements - the CQL table in
//! the target keyspace and the `ENGINE=SCYLLA` bridge table on the MariaDB
//! side - plus the set-based backfill statement.

use serde::{Deserialize, Serialize};

use crate::core::identifier::{qualify_mariadb, quote_mariadb, validate_cql_identifier};
use crate::core::schema::Table;
use crate::error::{Result, SetupError};
use crate::typemap::{self, CqlType};

use super::MirrorSettings;

/// One column of a mirror table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorColumn {
    /// Column name (same on both sides).
    pub name: String,

    /// Mapped CQL type.
    pub cql_type: CqlType,

    /// Full declared source type, used verbatim for the bridge table.
    pub source_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,
}

/// Target-store table definition derived from a source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorTableSpec {
    /// Table name (shared by source, bridge table, and CQL table).
    pub table: String,

    /// MariaDB database holding the bridge table.
    pub mirror_database: String,

    /// ScyllaDB keyspace.
    pub keyspace: String,

    /// Columns in source catalog order.
    pub columns: Vec<MirrorColumn>,

    /// Partition key: the first primary-key column, never composite.
    pub partition_key: String,

    /// Storage-bridge host (as resolvable by the source server).
    pub bridge_host: String,

    /// Storage-bridge CQL port.
    pub bridge_port: u16,

    /// Enable verbose logging in the storage bridge.
    pub verbose: bool,
}

impl MirrorTableSpec {
    /// Translate a source table into a mirror spec.
    ///
    /// Fails with [`SetupError::UnsupportedType`] if any column falls
    /// outside the supported type vocabulary, and with a config error if
    /// the table has no primary key (callers are expected to have skipped
    /// such tables already).
    pub fn synthesize(table: &Table, settings: &MirrorSettings) -> Result<Self> {
        let partition_key = table.partition_key().ok_or_else(|| {
            SetupError::Config(format!(
                "table {} has no primary key and cannot be mirrored",
                table.full_name()
            ))
        })?;

        // Names on the CQL side are emitted unquoted; reject anything the
        // unquoted grammar cannot express before touching either store.
        validate_cql_identifier(&table.name)?;
        for col in &table.columns {
            validate_cql_identifier(&col.name)?;
        }

        let columns = table
            .columns
            .iter()
            .map(|col| {
                Ok(MirrorColumn {
                    name: col.name.clone(),
                    cql_type: typemap::map_column(&table.name, col)?,
                    source_type: col.column_type.clone(),
                    is_nullable: col.is_nullable,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table: table.name.clone(),
            mirror_database: settings.mirror_database.clone(),
            keyspace: settings.keyspace.clone(),
            columns,
            partition_key: partition_key.to_string(),
            bridge_host: settings.bridge_host.clone(),
            bridge_port: settings.bridge_port,
            verbose: settings.debug_audit,
        })
    }

    /// CQL statement creating the table in the target keyspace.
    ///
    /// `IF NOT EXISTS` keeps re-runs from erroring; an existing table is
    /// never dropped or recreated.
    pub fn cql_create_statement(&self) -> String {
        let col_defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.cql_type))
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {}.{} (\n    {},\n    PRIMARY KEY ({})\n)",
            self.keyspace,
            self.table,
            col_defs.join(",\n    "),
            self.partition_key
        )
    }

    /// CQL statement creating the keyspace.
    pub fn cql_create_keyspace(keyspace: &str) -> Result<String> {
        validate_cql_identifier(keyspace)?;
        Ok(format!(
            "CREATE KEYSPACE IF NOT EXISTS {} \
             WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
            keyspace
        ))
    }

    /// MariaDB statement creating the storage-bridge table in the mirror
    /// database. Connection parameters persist in the table COMMENT, so
    /// they survive server restarts and are visible in trigger context.
    pub fn bridge_create_statement(&self) -> Result<String> {
        let mut col_defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let null_clause = if c.is_nullable { "" } else { " NOT NULL" };
                Ok(format!(
                    "{} {}{}",
                    quote_mariadb(&c.name)?,
                    c.source_type,
                    null_clause
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        col_defs.push(format!("PRIMARY KEY ({})", quote_mariadb(&self.partition_key)?));

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n) ENGINE=SCYLLA\nCOMMENT='{}'",
            qualify_mariadb(&self.mirror_database, &self.table)?,
            col_defs.join(",\n    "),
            self.bridge_comment()
        ))
    }

    /// Bridge connection parameters, `key=value` pairs separated by `;`.
    fn bridge_comment(&self) -> String {
        let mut comment = format!(
            "scylla_hosts={};scylla_port={};scylla_keyspace={};scylla_table={}",
            self.bridge_host, self.bridge_port, self.keyspace, self.table
        );
        if self.verbose {
            comment.push_str(";scylla_verbose=true");
        }
        comment
    }

    /// Fully qualified bridge table name for display.
    pub fn bridge_table_name(&self) -> String {
        format!("{}.{}", self.mirror_database, self.table)
    }
}

/// Set-based copy of all existing source rows into the bridge table.
///
/// Issued once per table, and only when the mirror table is empty.
pub fn backfill_statement(table: &Table, mirror_database: &str) -> Result<String> {
    let col_list = table
        .columns
        .iter()
        .map(|c| quote_mariadb(&c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({})\nSELECT {} FROM {}",
        qualify_mariadb(mirror_database, &table.name)?,
        col_list,
        col_list,
        qualify_mariadb(&table.schema, &table.name)?
    ))
}
