//! Schema versions for the organizer store.
//!
//! Each step is a batch of `IF NOT EXISTS` DDL tagged with the
//! `PRAGMA user_version` it leaves behind. Steps run in one transaction, so a
//! store is either fully at the target version or untouched.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    label: &'static str,
    ddl: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    label: "projects_tasks_history",
    ddl: include_str!("0001_init.sql"),
}];

/// Highest schema version this build can provision.
pub fn latest_version() -> u32 {
    STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Reads the schema version recorded in the store.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings the store up to [`latest_version`].
///
/// Fails with `UnsupportedSchemaVersion` when the store was written by a newer
/// build; such stores are never modified.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let target = latest_version();
    if found > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: target,
        });
    }

    let mut pending = STEPS.iter().filter(|step| step.version > found).peekable();
    if pending.peek().is_none() {
        debug!("event=db_migrate module=db status=skip version={found}");
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.ddl)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} label={}",
            step.version, step.label
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={target}");
    Ok(())
}
