//! Embedded schema steps for the task store.
//!
//! # Invariants
//! - Steps are listed in strictly increasing `version` order and never edited
//!   once released; schema changes append a new step.
//! - `PRAGMA user_version` always equals the last applied step.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "users_and_tasks",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "completion_preferences",
        sql: include_str!("0002_completion_preferences.sql"),
    },
];

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to `latest_version()`.
///
/// All pending steps share one transaction, so a failing step leaves the
/// schema where it was. A database written by a newer build is refused.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let target = latest_version();

    if found > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: target,
        });
    }
    if found == target {
        debug!("event=db_migrate module=db status=skipped version={found}");
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in STEPS.iter().skip_while(|step| step.version <= found) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={target}");
    Ok(())
}
