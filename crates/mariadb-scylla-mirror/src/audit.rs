//! Debug audit subsystem.
//!
//! An append-only execution trace recorded inside the source database.
//! Instrumented triggers write a START row before their mirroring
//! statements and an END row after; a START with no later matching END
//! marks a trigger that began but did not complete. That is the primary
//! diagnostic for the delete-then-insert update path, whose failure mode
//! is a transiently absent mirror row.
//!
//! The audit table lives under the reserved internal prefix, so it is
//! invisible to introspection and can never receive mirroring triggers
//! itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::identifier::{escape_sql_string, qualify_mariadb};
use crate::error::Result;
use crate::synth::TriggerEvent;

/// Name of the audit table inside the source database.
pub const AUDIT_TABLE: &str = "_mirror_trigger_audit";

/// Execution phase of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Start,
    End,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Start => "START",
            Phase::End => "END",
        })
    }
}

/// One persisted audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub log_id: u64,
    pub log_timestamp: DateTime<Utc>,
    pub table_name: String,
    pub trigger_name: String,
    pub event_type: String,
    pub phase: String,
    pub primary_key_value: Option<String>,
}

/// DDL creating the audit table if absent.
///
/// The column set is a fixed contract: auto-increment id, microsecond
/// timestamp default, and indexed (table, timestamp) and (timestamp)
/// access paths.
pub fn create_table_ddl(source_database: &str) -> Result<String> {
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n\
         \x20   log_id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,\n\
         \x20   log_timestamp TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),\n\
         \x20   table_name VARCHAR(64) NOT NULL,\n\
         \x20   trigger_name VARCHAR(80) NOT NULL,\n\
         \x20   event_type ENUM('INSERT', 'UPDATE', 'DELETE') NOT NULL,\n\
         \x20   phase ENUM('START', 'END') NOT NULL,\n\
         \x20   primary_key_value TEXT NULL,\n\
         \x20   KEY idx_audit_table_ts (table_name, log_timestamp),\n\
         \x20   KEY idx_audit_ts (log_timestamp)\n\
         ) ENGINE=InnoDB",
        qualify_mariadb(source_database, AUDIT_TABLE)?
    ))
}

/// Audit-write statement embedded in an instrumented trigger body.
///
/// `pk_expr` is a SQL expression evaluated in trigger context (e.g.
/// ``CAST(NEW.`id` AS CHAR)``); everything else is embedded as escaped
/// string literals.
pub fn insert_statement(
    source_database: &str,
    table: &str,
    trigger_name: &str,
    event: TriggerEvent,
    phase: Phase,
    pk_expr: &str,
) -> Result<String> {
    Ok(format!(
        "INSERT INTO {} (table_name, trigger_name, event_type, phase, primary_key_value)\n\
         \x20   VALUES ('{}', '{}', '{}', '{}', {});",
        qualify_mariadb(source_database, AUDIT_TABLE)?,
        escape_sql_string(table),
        escape_sql_string(trigger_name),
        event.keyword(),
        phase,
        pk_expr
    ))
}

/// Query returning START records with no later matching END.
///
/// A match shares the trigger name and primary-key value and has a higher
/// id. NULL-safe equality covers rows whose key value was NULL.
pub fn open_executions_query(source_database: &str) -> Result<String> {
    let audit = qualify_mariadb(source_database, AUDIT_TABLE)?;
    Ok(format!(
        "SELECT s.log_id, s.log_timestamp, s.table_name, s.trigger_name, \
         s.event_type, s.phase, s.primary_key_value\n\
         FROM {audit} s\n\
         WHERE s.phase = 'START'\n\
         \x20 AND NOT EXISTS (\n\
         \x20   SELECT 1 FROM {audit} e\n\
         \x20   WHERE e.phase = 'END'\n\
         \x20     AND e.trigger_name = s.trigger_name\n\
         \x20     AND e.primary_key_value <=> s.primary_key_value\n\
         \x20     AND e.log_id > s.log_id\n\
         \x20 )\n\
         ORDER BY s.log_id"
    ))
}
