use docket_core::db::migrations::latest_version;
use docket_core::db::{open_db, open_db_in_memory, DbError, StoreLocation};
use docket_core::{LocalStore, LocalStoreError, SqliteLocalStore};
use rusqlite::Connection;
use serde_json::json;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "local_store");
}

#[test]
fn opening_same_database_twice_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docket.db");

    let store = SqliteLocalStore::open(&path).unwrap();
    store.store("docs/p1", &json!(["a", "a.b"])).unwrap();
    drop(store);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    drop(conn);

    let reopened = SqliteLocalStore::open(&path).unwrap();
    assert_eq!(
        reopened.retrieve("docs/p1").unwrap(),
        Some(json!(["a", "a.b"]))
    );
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            location,
            db_version,
            latest_supported,
        } => {
            assert_eq!(location, StoreLocation::File(path.clone()));
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn open_failure_reports_file_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("docket.db");

    let err = open_db(&path).unwrap_err();

    assert!(matches!(
        err,
        DbError::Open { .. } | DbError::Migration { .. }
    ));
    assert_eq!(err.location(), &StoreLocation::File(path.clone()));
    assert!(err.to_string().contains("docket.db"));
}

#[test]
fn local_store_open_wraps_db_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    let err = SqliteLocalStore::open(&path).err().unwrap();
    match err {
        LocalStoreError::Db(db_err) => {
            assert_eq!(db_err.location(), &StoreLocation::File(path));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn local_store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteLocalStore::try_new(conn).err().unwrap();
    match err {
        LocalStoreError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
