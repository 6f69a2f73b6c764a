//! Database migration runner.
//!
//! Migrations are executed in order on every [`Database::open_at`]
//! call.  Each migration is guarded by a `user_version` pragma so it runs
//! exactly once.
//!
//! [`Database::open_at`]: crate::Database::open_at

pub mod v001_initial;
pub mod v002_accounts;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.  Bump this and add a new migration module whenever
/// the schema changes.
const CURRENT_VERSION: u32 = 2;

/// Run all pending migrations against the open connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current < 1 {
        tracing::info!("applying migration v001_initial");
        v001_initial::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    if current < 2 {
        tracing::info!("applying migration v002_accounts");
        v002_accounts::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 2)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_reach_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
