//! SQLite schema, versioned through `PRAGMA user_version`.
//!
//! `MIGRATIONS[i]` upgrades a database from version `i` to `i + 1`. A
//! database written by a newer schema is refused, never downgraded.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

const MIGRATIONS: &[&str] = &[
    // v1: every namespace shares one table; keys compare as raw bytes, so
    // big-endian heights scan in numeric order.
    "CREATE TABLE kv (
        namespace TEXT NOT NULL,
        key       BLOB NOT NULL,
        value     BLOB NOT NULL,
        PRIMARY KEY (namespace, key)
    ) WITHOUT ROWID;",
];

/// Schema version this build writes.
pub fn schema_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Bring `conn` up to [`schema_version`]. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let target = schema_version();

    if found > target {
        return Err(StoreError::Schema(format!(
            "database is at v{}, this build supports up to v{}",
            found, target
        )));
    }
    if found == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(found as usize) {
        tx.execute_batch(sql)?;
        debug!(version = index + 1, "applied schema migration");
    }
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_fresh_database_gets_kv_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let count: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(version(&conn), schema_version());
    }

    #[test]
    fn test_migrate_twice() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(version(&conn), 1);
    }

    #[test]
    fn test_newer_schema_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 99u32).unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Schema(_))));
    }
}
