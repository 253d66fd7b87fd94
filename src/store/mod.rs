//! SQLite store access
//!
//! The store is owned by the food-run service. This crate opens it, reads
//! runs/orders, and writes reward rows plus point increments. Nothing here
//! creates a database file implicitly: `open_store` refuses a missing path.

pub mod models;
pub mod schema;

pub use models::{Run, RunnerReward};
pub use schema::{apply_schema, ensure_reward_uniqueness};

use crate::error::{Result, RunpeakError};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Table names as the service creates them
pub const RUNS_TABLE: &str = "foodrun";
pub const ORDERS_TABLE: &str = "\"order\"";
pub const USERS_TABLE: &str = "user";
pub const REWARDS_TABLE: &str = "runnerreward";

/// `created_at` normalised so SQLite date functions also accept unix seconds
pub const CREATED_AT_EXPR: &str =
    "(CASE typeof(created_at) WHEN 'integer' THEN datetime(created_at, 'unixepoch') \
     WHEN 'real' THEN datetime(created_at, 'unixepoch') ELSE created_at END)";

/// Open an existing store and apply connection settings
///
/// Also installs the one-reward-per-run index when the reward table exists.
pub fn open_store(db_path: impl AsRef<Path>) -> Result<Connection> {
    let path = db_path.as_ref();
    if !path.exists() {
        return Err(RunpeakError::StoreNotFound(path.to_path_buf()));
    }

    let conn = Connection::open(path)?;
    apply_connection_pragmas(&conn)?;
    if table_exists(&conn, REWARDS_TABLE)? {
        ensure_reward_uniqueness(&conn)?;
    }

    log::info!("📂 Opened store: {}", path.display());
    Ok(conn)
}

/// Busy timeout lets a second writer wait on the lock instead of failing fast
pub fn apply_connection_pragmas(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
