//! Local key/value store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist JSON values by string key across process restarts.
//! - Hide SQL details from the document repository.
//!
//! # Invariants
//! - Storing `Value::Null` removes the key; `retrieve` then yields `None`.
//! - Last write wins on key collision. There are no transactions across keys.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type LocalStoreResult<T> = Result<T, LocalStoreError>;

#[derive(Debug)]
pub enum LocalStoreError {
    /// Database could not be opened or migrated.
    Db(DbError),
    /// A key/value statement failed on an open store.
    Query {
        operation: &'static str,
        source: rusqlite::Error,
    },
    /// Stored text could not be converted to/from JSON.
    Serialization { key: String, message: String },
    /// Connection was handed over without the expected schema.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for LocalStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Query { operation, source } => {
                write!(f, "local store {operation} failed: {source}")
            }
            Self::Serialization { key, message } => {
                write!(f, "invalid json stored at `{key}`: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "local store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for LocalStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Query { source, .. } => Some(source),
            Self::Serialization { .. } => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for LocalStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

fn query_failed(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> LocalStoreError {
    move |source| LocalStoreError::Query { operation, source }
}

/// Synchronous key/value persistence consumed by the document repository.
pub trait LocalStore {
    /// Returns the value stored under `key`, or `None` when absent.
    fn retrieve(&self, key: &str) -> LocalStoreResult<Option<Value>>;
    /// Stores `value` under `key`. `Value::Null` deletes the key.
    fn store(&self, key: &str, value: &Value) -> LocalStoreResult<()>;
}

/// SQLite-backed local store.
pub struct SqliteLocalStore {
    conn: Connection,
}

impl SqliteLocalStore {
    /// Wraps an already migrated connection.
    pub fn try_new(conn: Connection) -> LocalStoreResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
                .map_err(query_failed("schema check"))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(LocalStoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Opens (or creates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> LocalStoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a store that lives only as long as the returned value.
    pub fn open_in_memory() -> LocalStoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Number of stored keys.
    pub fn len(&self) -> LocalStoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM local_store;", [], |row| row.get(0))
            .map_err(query_failed("count"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> LocalStoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl LocalStore for SqliteLocalStore {
    fn retrieve(&self, key: &str) -> LocalStoreResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT store_value FROM local_store WHERE store_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_failed("retrieve"))?;

        match raw {
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|err| {
                LocalStoreError::Serialization {
                    key: key.to_string(),
                    message: err.to_string(),
                }
            }),
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, value: &Value) -> LocalStoreResult<()> {
        if value.is_null() {
            self.conn
                .execute("DELETE FROM local_store WHERE store_key = ?1;", [key])
                .map_err(query_failed("delete"))?;
            return Ok(());
        }

        let text = serde_json::to_string(value).map_err(|err| LocalStoreError::Serialization {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.conn
            .execute(
                "INSERT INTO local_store (store_key, store_value)
                 VALUES (?1, ?2)
                 ON CONFLICT(store_key) DO UPDATE SET
                    store_value = excluded.store_value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, text],
            )
            .map_err(query_failed("store"))?;
        Ok(())
    }
}
