//! Reference schema for the food-run store
//!
//! The SQL lives in `/sql/` and is embedded at build time. Every statement uses
//! `IF NOT EXISTS`, so applying it to a live store is a no-op.

use crate::error::Result;
use rusqlite::Connection;

/// Schema files in execution order
const MIGRATIONS: [(&str, &str); 4] = [
    ("01_user.sql", include_str!("../../sql/01_user.sql")),
    ("02_foodrun.sql", include_str!("../../sql/02_foodrun.sql")),
    ("03_order.sql", include_str!("../../sql/03_order.sql")),
    ("04_runnerreward.sql", include_str!("../../sql/04_runnerreward.sql")),
];

const REWARD_UNIQUE_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_runnerreward_run_id ON runnerreward(run_id)";

/// Create any missing tables and indexes
pub fn apply_schema(conn: &Connection) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        log::debug!("   ├─ Executing: {}", name);
        conn.execute_batch(sql)?;
    }
    ensure_reward_uniqueness(conn)?;
    log::debug!("✅ Schema up to date");
    Ok(())
}

/// Enforce one reward per run at the store level
///
/// Returns `false` when existing duplicate rows prevent the index; issuance
/// still guards each insert, so this only downgrades to a warning.
pub fn ensure_reward_uniqueness(conn: &Connection) -> Result<bool> {
    match conn.execute_batch(REWARD_UNIQUE_INDEX) {
        Ok(()) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            log::warn!(
                "⚠️  Duplicate rewards already stored, unique index on run_id not created: {}",
                msg.unwrap_or_default()
            );
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
