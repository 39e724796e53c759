//! Statement synthesis for mirror tables, triggers, and backfill.
//!
//! Everything here is pure: given introspected metadata and settings, these
//! functions produce DDL/DML text. No statement is executed in this module,
//! which keeps the generated SQL directly assertable in tests.

mod mirror;
mod trigger;

pub use mirror::{backfill_statement, MirrorColumn, MirrorTableSpec};
pub use trigger::{TriggerEvent, TriggerSpec};

use crate::config::Config;

/// Settings shared by all synthesizers, derived from the immutable config.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    /// MariaDB database holding the storage-bridge tables.
    pub mirror_database: String,

    /// ScyllaDB keyspace backing the mirror tables.
    pub keyspace: String,

    /// Host the storage bridge uses to reach ScyllaDB.
    pub bridge_host: String,

    /// CQL port of the target store.
    pub bridge_port: u16,

    /// Instrument triggers with the debug audit trail.
    pub debug_audit: bool,
}

impl From<&Config> for MirrorSettings {
    fn from(config: &Config) -> Self {
        Self {
            mirror_database: config.mirror.database.clone(),
            keyspace: config.target.keyspace.clone(),
            bridge_host: config.target.bridge_host.clone(),
            bridge_port: config.target.port,
            debug_audit: config.mirror.debug_audit,
        }
    }
}
