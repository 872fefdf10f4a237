//! Local store migration registry and executor.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Pending migrations run in one transaction; a failure leaves the
//!   previous version in place.

use crate::db::{DbError, DbResult, StoreLocation};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_local_store.sql"),
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the database at `location` up to `latest_version()`.
pub fn apply_migrations(conn: &mut Connection, location: &StoreLocation) -> DbResult<()> {
    let latest = latest_version();
    let failed_at = |version: u32| {
        move |source: rusqlite::Error| DbError::Migration {
            location: location.clone(),
            version,
            source,
        }
    };

    let current_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(failed_at(0))?;
    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            location: location.clone(),
            db_version: current_version,
            latest_supported: latest,
        });
    }
    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction().map_err(failed_at(current_version))?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(failed_at(migration.version))?;
    }
    tx.commit().map_err(failed_at(latest))
}
