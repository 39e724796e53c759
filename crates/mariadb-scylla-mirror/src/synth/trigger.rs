//! Mirroring trigger synthesis.
//!
//! Each source table gets three row-level AFTER triggers that propagate
//! changes into its bridge table:
//!
//! - INSERT: insert the new row's full column values.
//! - UPDATE: delete the mirror row keyed by the prior primary-key value,
//!   then insert the new row. The target store family offers no in-place
//!   column update through the bridge, so update is expressed as a
//!   replace. A failure between the two statements leaves the mirror row
//!   transiently absent; the audit trail (open START without END) is how
//!   that window is detected.
//! - DELETE: delete the mirror row keyed by the deleted row's key.
//!
//! Triggers execute inside the source engine's per-statement context: a
//! mirroring failure surfaces as a failure of the originating write.
//!
//! Idempotency is drop-then-create. Re-running setup always installs the
//! current definition and never hits a duplicate-trigger error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audit::{self, Phase};
use crate::core::identifier::{escape_sql_string, qualify_mariadb, quote_mariadb};
use crate::core::schema::Table;
use crate::error::{Result, SetupError};

use super::MirrorSettings;

/// Row event a trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    /// All three events, in installation order.
    pub const ALL: [TriggerEvent; 3] =
        [TriggerEvent::Insert, TriggerEvent::Update, TriggerEvent::Delete];

    /// SQL keyword (`AFTER <keyword>`, audit `event_type`).
    pub fn keyword(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }

    /// Lowercase token used in derived trigger names.
    fn name_token(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "insert",
            TriggerEvent::Update => "update",
            TriggerEvent::Delete => "delete",
        }
    }

    /// Row reference carrying the primary-key value for this event.
    /// UPDATE and DELETE key on the prior value.
    fn key_row(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "NEW",
            TriggerEvent::Update | TriggerEvent::Delete => "OLD",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One synthesized trigger: its derived name plus the drop and create
/// statements that install it idempotently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Source table name.
    pub table: String,

    /// Event the trigger fires on.
    pub event: TriggerEvent,

    /// Derived trigger name: `{table}_{event}_trigger`.
    pub name: String,

    /// `DROP TRIGGER IF EXISTS`, executed before create.
    pub drop_statement: String,

    /// `CREATE TRIGGER` with the full body.
    pub create_statement: String,
}

impl TriggerSpec {
    /// Synthesize all three triggers for a table.
    pub fn synthesize_all(table: &Table, settings: &MirrorSettings) -> Result<Vec<TriggerSpec>> {
        TriggerEvent::ALL
            .iter()
            .map(|event| Self::synthesize(table, *event, settings))
            .collect()
    }

    /// Synthesize the trigger for one event.
    pub fn synthesize(
        table: &Table,
        event: TriggerEvent,
        settings: &MirrorSettings,
    ) -> Result<TriggerSpec> {
        let pk = table.partition_key().ok_or_else(|| {
            SetupError::Config(format!(
                "table {} has no primary key and cannot have mirroring triggers",
                table.full_name()
            ))
        })?;

        let name = format!("{}_{}_trigger", table.name, event.name_token());
        let qualified_trigger = qualify_mariadb(&table.schema, &name)?;
        let qualified_source = qualify_mariadb(&table.schema, &table.name)?;
        let qualified_mirror = qualify_mariadb(&settings.mirror_database, &table.name)?;

        let drop_statement = format!("DROP TRIGGER IF EXISTS {}", qualified_trigger);

        let mut body = Vec::new();
        if settings.debug_audit {
            body.extend(Self::instrumentation(table, event, &name, pk, Phase::Start)?);
        }
        body.extend(Self::mirror_statements(
            table,
            event,
            &qualified_mirror,
            pk,
        )?);
        if settings.debug_audit {
            body.extend(Self::instrumentation(table, event, &name, pk, Phase::End)?);
        }

        let indented = body
            .iter()
            .flat_map(|stmt| stmt.lines())
            .map(|line| format!("    {}", line))
            .collect::<Vec<_>>()
            .join("\n");

        let create_statement = format!(
            "CREATE TRIGGER {}\nAFTER {} ON {}\nFOR EACH ROW\nBEGIN\n{}\nEND",
            qualified_trigger,
            event.keyword(),
            qualified_source,
            indented
        );

        Ok(TriggerSpec {
            table: table.name.clone(),
            event,
            name,
            drop_statement,
            create_statement,
        })
    }

    /// The mirroring statement(s) for one event.
    fn mirror_statements(
        table: &Table,
        event: TriggerEvent,
        qualified_mirror: &str,
        pk: &str,
    ) -> Result<Vec<String>> {
        let col_list = table
            .columns
            .iter()
            .map(|c| quote_mariadb(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let new_values = table
            .columns
            .iter()
            .map(|c| Ok(format!("NEW.{}", quote_mariadb(&c.name)?)))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let key_where = format!(
            "{} = {}.{}",
            quote_mariadb(pk)?,
            event.key_row(),
            quote_mariadb(pk)?
        );

        let insert = format!(
            "INSERT INTO {} ({})\n    VALUES ({});",
            qualified_mirror, col_list, new_values
        );
        let delete = format!("DELETE FROM {} WHERE {};", qualified_mirror, key_where);

        Ok(match event {
            TriggerEvent::Insert => vec![insert],
            // Replace: prior row out first, then the new row in.
            TriggerEvent::Update => vec![delete, insert],
            TriggerEvent::Delete => vec![delete],
        })
    }

    /// Audit write plus warning-channel notice for one phase.
    fn instrumentation(
        table: &Table,
        event: TriggerEvent,
        trigger_name: &str,
        pk: &str,
        phase: Phase,
    ) -> Result<Vec<String>> {
        let pk_expr = format!(
            "CAST({}.{} AS CHAR)",
            event.key_row(),
            quote_mariadb(pk)?
        );
        let audit_write = audit::insert_statement(
            &table.schema,
            &table.name,
            trigger_name,
            event,
            phase,
            &pk_expr,
        )?;
        let notice = format!(
            "SIGNAL SQLSTATE '01000' SET MESSAGE_TEXT = 'mirror: {} {}';",
            escape_sql_string(trigger_name),
            phase
        );
        Ok(vec![audit_write, notice])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Column;

    fn settings(debug_audit: bool) -> MirrorSettings {
        MirrorSettings {
            mirror_database: "scylla_db".to_string(),
            keyspace: "migration".to_string(),
            bridge_host: "scylladb-migration-target".to_string(),
            bridge_port: 9042,
            debug_audit,
        }
    }

    fn column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            data_type: "int".to_string(),
            column_type: "int(11)".to_string(),
            max_length: None,
            is_nullable: true,
            ordinal_pos: 0,
        }
    }

    fn sample_table() -> Table {
        Table {
            schema: "testdb".to_string(),
            name: "t".to_string(),
            columns: vec![column("id"), column("v")],
            primary_key: vec!["id".to_string()],
        }
    }

    #[test]
    fn test_synthesize_all_produces_three_triggers() {
        let specs = TriggerSpec::synthesize_all(&sample_table(), &settings(false)).unwrap();
        assert_eq!(specs.len(), 3);
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["t_insert_trigger", "t_update_trigger", "t_delete_trigger"]
        );
    }

    #[test]
    fn test_drop_statement_is_idempotent_form() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Insert, &settings(false))
                .unwrap();
        assert_eq!(
            spec.drop_statement,
            "DROP TRIGGER IF EXISTS `testdb`.`t_insert_trigger`"
        );
    }

    #[test]
    fn test_insert_trigger_body() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Insert, &settings(false))
                .unwrap();
        let sql = &spec.create_statement;
        assert!(sql.contains("CREATE TRIGGER `testdb`.`t_insert_trigger`"));
        assert!(sql.contains("AFTER INSERT ON `testdb`.`t`"));
        assert!(sql.contains("FOR EACH ROW"));
        assert!(sql.contains("INSERT INTO `scylla_db`.`t` (`id`, `v`)"));
        assert!(sql.contains("VALUES (NEW.`id`, NEW.`v`);"));
        assert!(!sql.contains("DELETE FROM"));
    }

    #[test]
    fn test_update_trigger_is_delete_then_insert() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Update, &settings(false))
                .unwrap();
        let sql = &spec.create_statement;
        let delete_pos = sql
            .find("DELETE FROM `scylla_db`.`t` WHERE `id` = OLD.`id`;")
            .expect("delete statement present");
        let insert_pos = sql
            .find("INSERT INTO `scylla_db`.`t` (`id`, `v`)")
            .expect("insert statement present");
        assert!(delete_pos < insert_pos, "delete must precede insert");
        // No in-place update through the bridge
        assert!(!sql.contains("UPDATE `scylla_db`"));
    }

    #[test]
    fn test_delete_trigger_body() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Delete, &settings(false))
                .unwrap();
        let sql = &spec.create_statement;
        assert!(sql.contains("AFTER DELETE ON `testdb`.`t`"));
        assert!(sql.contains("DELETE FROM `scylla_db`.`t` WHERE `id` = OLD.`id`;"));
        assert!(!sql.contains("INSERT INTO `scylla_db`"));
    }

    #[test]
    fn test_composite_pk_keys_on_first_column() {
        let mut table = sample_table();
        table.columns.push(column("region"));
        table.primary_key = vec!["id".to_string(), "region".to_string()];
        let spec =
            TriggerSpec::synthesize(&table, TriggerEvent::Delete, &settings(false)).unwrap();
        assert!(spec
            .create_statement
            .contains("WHERE `id` = OLD.`id`;"));
        assert!(!spec.create_statement.contains("`region` = OLD.`region`"));
    }

    #[test]
    fn test_overlong_derived_trigger_name_is_rejected() {
        // "_insert_trigger" adds 15 chars; 64 is the identifier cap
        let mut table = sample_table();
        table.name = "t".repeat(50);
        assert!(TriggerSpec::synthesize(&table, TriggerEvent::Insert, &settings(false)).is_err());

        table.name = "t".repeat(49);
        assert!(TriggerSpec::synthesize(&table, TriggerEvent::Insert, &settings(false)).is_ok());
    }

    #[test]
    fn test_no_pk_is_an_error() {
        let mut table = sample_table();
        table.primary_key.clear();
        assert!(TriggerSpec::synthesize(&table, TriggerEvent::Insert, &settings(false)).is_err());
    }

    #[test]
    fn test_instrumented_trigger_wraps_body() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Update, &settings(true))
                .unwrap();
        let sql = &spec.create_statement;

        let start_audit = sql.find("'t', 't_update_trigger', 'UPDATE', 'START'").unwrap();
        let delete_pos = sql.find("DELETE FROM `scylla_db`.`t`").unwrap();
        let insert_pos = sql.find("INSERT INTO `scylla_db`.`t`").unwrap();
        let end_audit = sql.find("'t', 't_update_trigger', 'UPDATE', 'END'").unwrap();

        assert!(start_audit < delete_pos);
        assert!(delete_pos < insert_pos);
        assert!(insert_pos < end_audit);

        // Warning-channel notices at both points
        assert!(sql.contains(
            "SIGNAL SQLSTATE '01000' SET MESSAGE_TEXT = 'mirror: t_update_trigger START';"
        ));
        assert!(sql.contains(
            "SIGNAL SQLSTATE '01000' SET MESSAGE_TEXT = 'mirror: t_update_trigger END';"
        ));

        // UPDATE keys the audit rows on the prior value, both phases
        assert_eq!(sql.matches("CAST(OLD.`id` AS CHAR)").count(), 2);
    }

    #[test]
    fn test_uninstrumented_trigger_has_no_audit_writes() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Insert, &settings(false))
                .unwrap();
        assert!(!spec.create_statement.contains("_mirror_trigger_audit"));
        assert!(!spec.create_statement.contains("SIGNAL"));
    }

    #[test]
    fn test_insert_event_audits_new_key() {
        let spec =
            TriggerSpec::synthesize(&sample_table(), TriggerEvent::Insert, &settings(true))
                .unwrap();
        assert!(spec
            .create_statement
            .contains("CAST(NEW.`id` AS CHAR)"));
    }
}
