//! Client seams for the two databases.
//!
//! The orchestrator is written against these traits so that its sequencing
//! and idempotency logic can be tested with in-memory fakes, while the
//! concrete implementations ([`crate::source::MariadbCatalog`] and
//! [`crate::target::ScyllaStore`]) stay thin wrappers over their client
//! libraries.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::Table;

/// Read and mutate the source relational catalog (MariaDB).
///
/// Introspection methods are pure reads; `execute_ddl`/`execute_dml` carry
/// the trigger installation, mirror-side DDL, and backfill.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Extract table metadata for all user tables in a schema.
    ///
    /// Tables whose names fall under the reserved internal prefix are
    /// excluded unconditionally. A table without a primary key is returned
    /// with an empty `primary_key` so the orchestrator can skip and report
    /// it rather than abort the run.
    async fn extract_schema(&self, schema: &str) -> Result<Vec<Table>>;

    /// Execute a DDL statement (CREATE DATABASE/TABLE/TRIGGER, DROP TRIGGER).
    async fn execute_ddl(&self, sql: &str) -> Result<()>;

    /// Execute a DML statement, returning the number of affected rows.
    async fn execute_dml(&self, sql: &str) -> Result<u64>;

    /// Check whether a table exists.
    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool>;

    /// Ordered column names of an existing table.
    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>>;

    /// Row count of a table.
    async fn row_count(&self, schema: &str, table: &str) -> Result<i64>;
}

/// Execute DDL against the target wide-column store (ScyllaDB).
///
/// Used only for the direct keyspace/table creation path; live replication
/// flows through the source engine's storage bridge, not this client.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Execute a CQL DDL statement.
    async fn execute_ddl(&self, cql: &str) -> Result<()>;
}
