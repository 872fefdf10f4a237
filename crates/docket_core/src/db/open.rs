//! Connection bootstrap for the local store database.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Every open attempt emits one `db_open` start event and one terminal event.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, StoreLocation};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a database file and applies pending migrations.
///
/// File-backed databases keep cached documents across process restarts.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(StoreLocation::file(path), || Connection::open(path))
}

/// Opens a throwaway in-memory database with migrations applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(StoreLocation::Memory, Connection::open_in_memory)
}

fn open_with(
    location: StoreLocation,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect()
        .and_then(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(conn)
        })
        .map_err(|source| DbError::Open {
            location: location.clone(),
            source,
        })
        .and_then(|mut conn| {
            apply_migrations(&mut conn, &location)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            error_code(err),
            err
        ),
    }
    result
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Open { .. } => "db_open_failed",
        DbError::Migration { .. } => "db_migration_failed",
        DbError::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
    }
}
