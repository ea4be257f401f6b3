use appointly_core::db::migrations::latest_version;
use appointly_core::db::{open_db, open_db_in_memory, DbError};
use appointly_core::{
    AppointmentForm, AppointmentStore, BookingService, KeyValueStorage, PersistenceError,
    SqliteStorage, StorageError,
};
use rusqlite::Connection;

fn organization_form(name: &str) -> AppointmentForm {
    AppointmentForm {
        reservation_type: Some("organization".to_string()),
        date: Some("2025-03-04".to_string()),
        time: Some("10:30".to_string()),
        contact_name: Some(name.to_string()),
        email: Some("fleet@acme.io".to_string()),
        phone: Some("(555) 010-2030".to_string()),
        number_of_people: Some(12),
        vehicle_plate: Some("ACME-01".to_string()),
        vehicle_model: None,
    }
}

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_store");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("appointly.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "kv_store");
}

#[test]
fn open_db_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data").join("appointly.db");

    open_db(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn open_db_reports_unusable_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    match open_db(blocker.join("appointly.db")).unwrap_err() {
        DbError::CreateDir { path, .. } => assert_eq!(path, blocker),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn storage_rejects_connection_without_kv_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteStorage::try_new(&conn);
    assert!(matches!(
        result,
        Err(StorageError::MissingRequiredTable("kv_store"))
    ));
}

#[test]
fn appointments_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("appointly.db");

    let created = {
        let conn = open_db(&path).unwrap();
        let service = BookingService::new(AppointmentStore::new(
            SqliteStorage::try_new(&conn).unwrap(),
        ));
        service.submit(&organization_form("Acme Fleet")).unwrap()
    };
    assert_eq!(created.number_of_people, None);

    let conn = open_db(&path).unwrap();
    let store = AppointmentStore::new(SqliteStorage::try_new(&conn).unwrap());
    assert_eq!(store.list_all(), vec![created]);
}

#[test]
fn corrupted_row_reads_empty_and_is_replaced_by_next_append() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES ('appointments', '[{\"broken\":');",
        [],
    )
    .unwrap();
    let store = AppointmentStore::new(SqliteStorage::try_new(&conn).unwrap());

    assert!(store.list_all().is_empty());

    let form = organization_form("Acme Fleet");
    let created = store.append(form.validate().unwrap()).unwrap();
    assert_eq!(store.list_all(), vec![created]);
}

#[test]
fn quota_failure_keeps_stored_row() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap().with_quota(400);
    let store = AppointmentStore::new(storage);

    let first = store
        .append(organization_form("Acme Fleet").validate().unwrap())
        .unwrap();
    let err = store
        .append(organization_form("Acme Fleet").validate().unwrap())
        .unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::Storage(StorageError::QuotaExceeded { .. })
    ));
    assert_eq!(store.list_all(), vec![first]);
}

#[test]
fn dropped_table_degrades_reads_and_fails_writes() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    storage.set_item("appointments", "[]").unwrap();
    conn.execute_batch("DROP TABLE kv_store;").unwrap();
    let store = AppointmentStore::new(storage);

    assert!(store.list_all().is_empty());
    let err = store
        .append(organization_form("Acme Fleet").validate().unwrap())
        .unwrap_err();
    assert!(matches!(err, PersistenceError::Storage(StorageError::Db(_))));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
