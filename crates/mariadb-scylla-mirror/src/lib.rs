//! # mariadb-scylla-mirror
//!
//! Schema-driven replication setup between MariaDB and ScyllaDB.
//!
//! This library inspects a MariaDB source schema, derives a compatible
//! ScyllaDB schema, installs synchronization triggers that keep the two
//! stores consistent, and performs an idempotent one-time backfill:
//!
//! - **Catalog introspection** of tables, columns, and primary keys
//! - **Type mapping** from MariaDB column types to CQL types
//! - **Trigger synthesis** (insert / delete-then-insert update / delete)
//! - **Idempotent orchestration** - safe to re-run against existing state
//! - **Debug audit trail** for diagnosing incomplete trigger executions
//!
//! ## Example
//!
//! ```rust,no_run
//! use mariadb_scylla_mirror::{Config, MariadbCatalog, Orchestrator, ScyllaStore};
//!
//! #[tokio::main]
//! async fn main() -> mariadb_scylla_mirror::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let source = MariadbCatalog::connect(&config.source).await?;
//!     let target = ScyllaStore::connect(&config.target).await?;
//!     let report = Orchestrator::new(config, source, target).run().await?;
//!     println!("{} tables mirrored", report.tables_mirrored);
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod synth;
pub mod target;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, MirrorConfig, SourceConfig, TargetConfig};
pub use crate::core::schema::{Column, Table};
pub use crate::core::traits::{SourceCatalog, TargetStore};
pub use error::{Result, SetupError};
pub use orchestrator::{
    Orchestrator, SetupReport, TableOutcome, TablePlan, TableStatus, ValidationOutcome,
};
pub use source::MariadbCatalog;
pub use synth::{MirrorTableSpec, TriggerEvent, TriggerSpec};
pub use target::ScyllaStore;
pub use typemap::CqlType;
