//! Configuration type definitions.
//!
//! The configuration is an explicit immutable value handed to the
//! orchestrator at construction. There is no process-wide mutable state:
//! connection parameters for the storage bridge are re-derived from this
//! value on every run and embedded per-table at creation time.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source catalog configuration (MariaDB).
    pub source: SourceConfig,

    /// Target store configuration (ScyllaDB).
    pub target: TargetConfig,

    /// Mirror namespace and instrumentation configuration.
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Source catalog (MariaDB) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database host.
    #[serde(default = "default_mariadb_host")]
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mariadb_port")]
    pub port: u16,

    /// Username.
    #[serde(default = "default_mariadb_user")]
    pub user: String,

    /// Password.
    pub password: String,

    /// Source database holding the tables to mirror.
    pub database: String,
}

/// Target store (ScyllaDB) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// CQL host for the direct client connection.
    #[serde(default = "default_scylla_host")]
    pub host: String,

    /// CQL port (default: 9042).
    #[serde(default = "default_scylla_port")]
    pub port: u16,

    /// Username (optional).
    #[serde(default)]
    pub user: Option<String>,

    /// Password (optional).
    #[serde(default)]
    pub password: Option<String>,

    /// Keyspace backing the mirror tables.
    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    /// Host the source engine's storage bridge uses to reach the store.
    /// Usually a container name, distinct from `host` as seen by this
    /// process. Embedded in each bridge table's COMMENT.
    #[serde(default = "default_bridge_host")]
    pub bridge_host: String,
}

/// Mirror namespace and debug instrumentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// MariaDB database holding the storage-bridge tables.
    #[serde(default = "default_mirror_database")]
    pub database: String,

    /// Instrument triggers with the debug audit trail.
    #[serde(default)]
    pub debug_audit: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            database: default_mirror_database(),
            debug_audit: false,
        }
    }
}

// Default value functions for serde

fn default_mariadb_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mariadb_port() -> u16 {
    3306
}

fn default_mariadb_user() -> String {
    "root".to_string()
}

fn default_scylla_host() -> String {
    "localhost".to_string()
}

fn default_scylla_port() -> u16 {
    9042
}

fn default_keyspace() -> String {
    "migration".to_string()
}

fn default_bridge_host() -> String {
    "scylladb-migration-target".to_string()
}

fn default_mirror_database() -> String {
    "scylla_db".to_string()
}
