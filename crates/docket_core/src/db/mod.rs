//! SQLite bootstrap for the local document cache.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing `SqliteLocalStore`.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No key/value reads or writes happen before migrations succeed.
//! - Every bootstrap failure names the store location it happened on.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Where a local store database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Private to one connection; gone once it closes.
    Memory,
}

impl StoreLocation {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Short tag used in `db_open` log events.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "`{}`", path.display()),
            Self::Memory => write!(f, "in-memory store"),
        }
    }
}

/// Failures while bringing a local store database to the current schema.
#[derive(Debug)]
pub enum DbError {
    /// Connection could not be opened or configured.
    Open {
        location: StoreLocation,
        source: rusqlite::Error,
    },
    /// Reading the schema version or applying `version` failed.
    Migration {
        location: StoreLocation,
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        location: StoreLocation,
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    pub fn location(&self) -> &StoreLocation {
        match self {
            Self::Open { location, .. }
            | Self::Migration { location, .. }
            | Self::UnsupportedSchemaVersion { location, .. } => location,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open local store {location}: {source}")
            }
            Self::Migration {
                location,
                version,
                source,
            } => write!(
                f,
                "local store {location} failed at schema version {version}: {source}"
            ),
            Self::UnsupportedSchemaVersion {
                location,
                db_version,
                latest_supported,
            } => write!(
                f,
                "local store {location} has schema version {db_version}, newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}
