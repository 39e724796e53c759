//! Setup orchestration.
//!
//! Drives the full sequence against live stores: mirror database and
//! keyspace, optional audit table, then per table the CQL mirror table,
//! the storage-bridge table, the three triggers, and a one-time backfill.
//! Every statement is idempotent or guarded, so re-running setup converges
//! on the same state instead of erroring or duplicating data.
//!
//! A failure while processing one table is recorded in the report and does
//! not stop the remaining tables. Failures before the per-table loop
//! (connections, database or keyspace creation) abort the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit;
use crate::config::Config;
use crate::core::identifier::quote_mariadb;
use crate::core::schema::Table;
use crate::core::traits::{SourceCatalog, TargetStore};
use crate::error::{Result, SetupError};
use crate::synth::{backfill_statement, MirrorSettings, MirrorTableSpec, TriggerSpec};

/// Final state of one table after a setup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    /// Mirror table, bridge table, and triggers are in place.
    Mirrored {
        /// Rows copied by the backfill; 0 when the mirror already had data.
        backfilled_rows: u64,
    },
    /// The table was not eligible for mirroring.
    Skipped { reason: String },
    /// Setup for this table failed partway through.
    Failed { reason: String },
}

/// Per-table entry in a [`SetupReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: String,
    #[serde(flatten)]
    pub status: TableStatus,
}

/// Result of a full setup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub outcomes: Vec<TableOutcome>,
    pub tables_mirrored: usize,
    pub tables_skipped: usize,
    pub tables_failed: usize,
}

impl SetupReport {
    fn from_outcomes(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        duration_seconds: f64,
        outcomes: Vec<TableOutcome>,
    ) -> Self {
        let tables_mirrored = outcomes
            .iter()
            .filter(|o| matches!(o.status, TableStatus::Mirrored { .. }))
            .count();
        let tables_skipped = outcomes
            .iter()
            .filter(|o| matches!(o.status, TableStatus::Skipped { .. }))
            .count();
        let tables_failed = outcomes
            .iter()
            .filter(|o| matches!(o.status, TableStatus::Failed { .. }))
            .count();
        Self {
            run_id,
            started_at,
            duration_seconds,
            outcomes,
            tables_mirrored,
            tables_skipped,
            tables_failed,
        }
    }

    /// True when no table failed.
    pub fn is_success(&self) -> bool {
        self.tables_failed == 0
    }
}

/// Row-count comparison between a source table and its mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub table: String,
    pub source_rows: i64,
    /// `None` when the bridge table does not exist.
    pub mirror_rows: Option<i64>,
    pub matched: bool,
}

/// Planned statements for one table, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePlan {
    pub table: String,
    pub statements: Vec<String>,
}

/// Drives setup against a source catalog and a target store.
pub struct Orchestrator<S, T> {
    config: Config,
    settings: MirrorSettings,
    source: S,
    target: T,
}

impl<S: SourceCatalog, T: TargetStore> Orchestrator<S, T> {
    pub fn new(config: Config, source: S, target: T) -> Self {
        let settings = MirrorSettings::from(&config);
        Self {
            config,
            settings,
            source,
            target,
        }
    }

    /// Run the full setup sequence.
    pub async fn run(&self) -> Result<SetupReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(
            "Starting mirror setup {}: {} -> {}.{}",
            run_id, self.config.source.database, self.config.target.keyspace,
            self.settings.mirror_database
        );

        self.create_shared_objects().await?;

        let tables = self.source.extract_schema(&self.config.source.database).await?;
        info!("Discovered {} source tables", tables.len());

        let mut outcomes = Vec::with_capacity(tables.len());
        for table in &tables {
            let status = if !table.has_pk() {
                warn!("Skipping {}: no primary key", table.full_name());
                TableStatus::Skipped {
                    reason: "no primary key".to_string(),
                }
            } else {
                match self.setup_table(table).await {
                    Ok(backfilled_rows) => {
                        info!(
                            "Mirrored {} ({} rows backfilled)",
                            table.full_name(),
                            backfilled_rows
                        );
                        TableStatus::Mirrored { backfilled_rows }
                    }
                    Err(err) => {
                        error!("Setup failed for {}: {}", table.full_name(), err);
                        TableStatus::Failed {
                            reason: err.to_string(),
                        }
                    }
                }
            };
            outcomes.push(TableOutcome {
                table: table.name.clone(),
                status,
            });
        }

        let report = SetupReport::from_outcomes(
            run_id,
            started_at,
            start.elapsed().as_secs_f64(),
            outcomes,
        );
        info!(
            "Setup complete: {} mirrored, {} skipped, {} failed",
            report.tables_mirrored, report.tables_skipped, report.tables_failed
        );
        Ok(report)
    }

    /// Render every statement a run would execute, without executing any.
    ///
    /// Only introspection queries touch the stores. Tables that would be
    /// skipped or fail synthesis get an empty statement list annotated via
    /// a comment-style first entry.
    pub async fn dry_run(&self) -> Result<Vec<TablePlan>> {
        let mut plans = vec![TablePlan {
            table: "(shared)".to_string(),
            statements: self.shared_statements()?,
        }];

        let tables = self.source.extract_schema(&self.config.source.database).await?;
        for table in &tables {
            let statements = match self.table_statements(table) {
                Ok(statements) => statements,
                Err(err) => vec![format!("-- not mirrored: {}", err)],
            };
            plans.push(TablePlan {
                table: table.name.clone(),
                statements,
            });
        }

        Ok(plans)
    }

    /// Compare source and mirror row counts for every mirrorable table.
    ///
    /// A live trigger stream means counts can legitimately diverge for a
    /// moment under write load; persistent mismatches point at a failed
    /// setup or an incomplete trigger execution.
    pub async fn validate(&self) -> Result<Vec<ValidationOutcome>> {
        let tables = self.source.extract_schema(&self.config.source.database).await?;

        let mut outcomes = Vec::new();
        for table in tables.iter().filter(|t| t.has_pk()) {
            let source_rows = self.source.row_count(&table.schema, &table.name).await?;

            let mirror_rows = if self
                .source
                .table_exists(&self.settings.mirror_database, &table.name)
                .await?
            {
                Some(
                    self.source
                        .row_count(&self.settings.mirror_database, &table.name)
                        .await?,
                )
            } else {
                None
            };

            let matched = mirror_rows == Some(source_rows);
            if !matched {
                warn!(
                    "Row count mismatch for {}: source={}, mirror={:?}",
                    table.full_name(),
                    source_rows,
                    mirror_rows
                );
            }

            outcomes.push(ValidationOutcome {
                table: table.name.clone(),
                source_rows,
                mirror_rows,
                matched,
            });
        }

        Ok(outcomes)
    }

    /// Shared objects that precede the per-table loop.
    async fn create_shared_objects(&self) -> Result<()> {
        self.source
            .execute_ddl(&self.mirror_database_ddl()?)
            .await?;
        self.target
            .execute_ddl(&MirrorTableSpec::cql_create_keyspace(
                &self.settings.keyspace,
            )?)
            .await?;

        if self.settings.debug_audit {
            self.source
                .execute_ddl(&audit::create_table_ddl(&self.config.source.database)?)
                .await?;
            info!("Debug audit trail enabled");
        }

        Ok(())
    }

    /// Set up one table end to end. Returns the number of backfilled rows.
    async fn setup_table(&self, table: &Table) -> Result<u64> {
        let spec = MirrorTableSpec::synthesize(table, &self.settings)?;

        self.target.execute_ddl(&spec.cql_create_statement()).await?;

        self.ensure_bridge_table(table, &spec).await?;

        for trigger in TriggerSpec::synthesize_all(table, &self.settings)? {
            self.source.execute_ddl(&trigger.drop_statement).await?;
            self.source.execute_ddl(&trigger.create_statement).await?;
            debug!("Installed trigger {}", trigger.name);
        }

        self.backfill(table).await
    }

    /// Create the bridge table, or verify an existing one is compatible.
    ///
    /// An existing table whose ordered column names differ from the source
    /// is a conflict: dropping it would discard the mirror binding, so the
    /// mismatch is surfaced instead.
    async fn ensure_bridge_table(&self, table: &Table, spec: &MirrorTableSpec) -> Result<()> {
        let exists = self
            .source
            .table_exists(&self.settings.mirror_database, &table.name)
            .await?;

        if exists {
            let existing = self
                .source
                .column_names(&self.settings.mirror_database, &table.name)
                .await?;
            if existing != table.column_names() {
                return Err(SetupError::ddl_conflict(
                    spec.bridge_table_name(),
                    format!(
                        "existing columns [{}] do not match source columns [{}]",
                        existing.join(", "),
                        table.column_names().join(", ")
                    ),
                ));
            }
            debug!("Bridge table {} already present", spec.bridge_table_name());
            return Ok(());
        }

        self.source
            .execute_ddl(&spec.bridge_create_statement()?)
            .await
    }

    /// Copy existing source rows, only into an empty mirror.
    async fn backfill(&self, table: &Table) -> Result<u64> {
        let existing = self
            .source
            .row_count(&self.settings.mirror_database, &table.name)
            .await?;
        if existing > 0 {
            debug!(
                "Mirror table for {} already holds {} rows, skipping backfill",
                table.full_name(),
                existing
            );
            return Ok(0);
        }

        self.source
            .execute_dml(&backfill_statement(table, &self.settings.mirror_database)?)
            .await
    }

    fn mirror_database_ddl(&self) -> Result<String> {
        Ok(format!(
            "CREATE DATABASE IF NOT EXISTS {}",
            quote_mariadb(&self.settings.mirror_database)?
        ))
    }

    fn shared_statements(&self) -> Result<Vec<String>> {
        let mut statements = vec![
            self.mirror_database_ddl()?,
            MirrorTableSpec::cql_create_keyspace(&self.settings.keyspace)?,
        ];
        if self.settings.debug_audit {
            statements.push(audit::create_table_ddl(&self.config.source.database)?);
        }
        Ok(statements)
    }

    fn table_statements(&self, table: &Table) -> Result<Vec<String>> {
        if !table.has_pk() {
            return Err(SetupError::Config(format!(
                "table {} has no primary key",
                table.full_name()
            )));
        }
        let spec = MirrorTableSpec::synthesize(table, &self.settings)?;
        let mut statements = vec![spec.cql_create_statement(), spec.bridge_create_statement()?];
        for trigger in TriggerSpec::synthesize_all(table, &self.settings)? {
            statements.push(trigger.drop_statement);
            statements.push(trigger.create_statement);
        }
        statements.push(backfill_statement(table, &self.settings.mirror_database)?);
        Ok(statements)
    }
}
