//! MariaDB source catalog implementation.
//!
//! Implements the [`SourceCatalog`] trait over a SQLx connection pool.
//! Introspection uses bound-parameter `information_schema` queries. DDL
//! and DML text arrives pre-built from the synthesizers, escaped by
//! construction, and is executed unprepared over the text protocol:
//! trigger DDL cannot go through the prepared-statement path.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::Row;
use tracing::{debug, info};

use crate::audit::{self, AuditEntry};
use crate::config::SourceConfig;
use crate::core::identifier::qualify_mariadb;
use crate::core::schema::{Column, Table};
use crate::core::traits::SourceCatalog;
use crate::error::Result;

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Table processing is sequential; a handful of connections is plenty.
const POOL_MAX_CONNECTIONS: u32 = 4;

/// MariaDB catalog client.
pub struct MariadbCatalog {
    pool: MySqlPool,
}

impl MariadbCatalog {
    /// Connect to the source database.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(POOL_MAX_CONNECTIONS)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await?;

        // Test connection
        sqlx::query("SELECT 1").fetch_one(&pool).await?;

        info!(
            "Connected to MariaDB source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool })
    }

    /// Test the connection.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Fetch audit START records with no matching END.
    pub async fn fetch_open_audit_entries(&self, schema: &str) -> Result<Vec<AuditEntry>> {
        let query = audit::open_executions_query(schema)?;
        let rows: Vec<MySqlRow> = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| AuditEntry {
                log_id: row.get("log_id"),
                log_timestamp: row.get("log_timestamp"),
                table_name: row.get("table_name"),
                trigger_name: row.get("trigger_name"),
                event_type: row.get("event_type"),
                phase: row.get("phase"),
                primary_key_value: row.get("primary_key_value"),
            })
            .collect())
    }

    /// Load columns for a table in ordinal order.
    async fn load_columns(&self, table: &mut Table) -> Result<()> {
        // CAST string columns to CHAR to sidestep collation differences
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(DATA_TYPE AS CHAR(255)) AS DATA_TYPE,
                CAST(COLUMN_TYPE AS CHAR(255)) AS COLUMN_TYPE,
                CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS max_length,
                IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                CAST(ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&table.schema)
            .bind(&table.name)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            table.columns.push(Column {
                name: row.get::<String, _>("COLUMN_NAME"),
                data_type: row.get::<String, _>("DATA_TYPE"),
                column_type: row.get::<String, _>("COLUMN_TYPE"),
                max_length: row.get::<Option<i64>, _>("max_length"),
                is_nullable: row.get::<i64, _>("is_nullable") == 1,
                ordinal_pos: row.get::<i64, _>("ORDINAL_POSITION") as i32,
            });
        }

        Ok(())
    }

    /// Load primary key columns in constraint order.
    async fn load_primary_key(&self, table: &mut Table) -> Result<()> {
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&table.schema)
            .bind(&table.name)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            table.primary_key.push(row.get::<String, _>("COLUMN_NAME"));
        }

        Ok(())
    }
}

#[async_trait]
impl SourceCatalog for MariadbCatalog {
    async fn extract_schema(&self, schema: &str) -> Result<Vec<Table>> {
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(schema)
            .fetch_all(&self.pool)
            .await?;

        let mut tables = Vec::new();
        for row in rows {
            let name: String = row.get("TABLE_NAME");

            // Reserved internal names are invisible to mirroring
            if Table::is_reserved_name(&name) {
                debug!("Excluding internal table {}.{}", schema, name);
                continue;
            }

            let mut table = Table {
                schema: schema.to_string(),
                name,
                columns: Vec::new(),
                primary_key: Vec::new(),
            };
            self.load_columns(&mut table).await?;
            self.load_primary_key(&mut table).await?;
            tables.push(table);
        }

        Ok(tables)
    }

    async fn execute_ddl(&self, sql: &str) -> Result<()> {
        // CREATE TRIGGER bodies are not preparable on MySQL or on MariaDB
        // before 10.6.2, so statement text runs over the text protocol.
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn execute_dml(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT CAST(COLUMN_NAME AS CHAR(255)) FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn row_count(&self, schema: &str, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", qualify_mariadb(schema, table)?);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;

    fn local_config() -> SourceConfig {
        SourceConfig {
            host: std::env::var("MARIADB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: 3306,
            user: "root".to_string(),
            password: std::env::var("MARIADB_ROOT_PASSWORD").unwrap_or_default(),
            database: std::env::var("MARIADB_DATABASE").unwrap_or_else(|_| "test".to_string()),
        }
    }

    /// Requires a local MariaDB with the credentials above; run with
    /// `cargo test -- --ignored`.
    ///
    /// Trigger DDL is rejected by the prepared-statement protocol, so this
    /// only passes when `execute_ddl` runs statement text unprepared.
    #[tokio::test]
    #[ignore]
    async fn test_execute_ddl_installs_trigger() {
        let catalog = MariadbCatalog::connect(&local_config()).await.unwrap();

        catalog
            .execute_ddl("CREATE TABLE IF NOT EXISTS ddl_check (id INT PRIMARY KEY)")
            .await
            .unwrap();
        catalog
            .execute_ddl("DROP TRIGGER IF EXISTS ddl_check_insert_trigger")
            .await
            .unwrap();
        catalog
            .execute_ddl(
                "CREATE TRIGGER ddl_check_insert_trigger\n\
                 AFTER INSERT ON ddl_check\n\
                 FOR EACH ROW\n\
                 BEGIN\n\
                 \x20   SET @ddl_check_last_id = NEW.id;\n\
                 END",
            )
            .await
            .unwrap();

        catalog
            .execute_ddl("DROP TRIGGER IF EXISTS ddl_check_insert_trigger")
            .await
            .unwrap();
        catalog.execute_ddl("DROP TABLE ddl_check").await.unwrap();
    }
}
