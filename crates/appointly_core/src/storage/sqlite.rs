//! SQLite-backed key/value storage.
//!
//! # Responsibility
//! - Persist namespaced values in the `kv_store` table.
//! - Refuse connections that were not bootstrapped through `db::open_db*`.
//!
//! # Invariants
//! - `set_item` is a single upsert statement; readers never observe a
//!   partially written value.
//! - The quota check and the upsert run in one transaction.

use super::{check_quota, KeyValueStorage, StorageError, StorageResult};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

const KV_TABLE: &str = "kv_store";

/// Key/value storage over a migrated SQLite connection.
pub struct SqliteStorage<'conn> {
    conn: &'conn Connection,
    quota_bytes: Option<usize>,
}

impl<'conn> SqliteStorage<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when `kv_store` does not exist.
    pub fn try_new(conn: &'conn Connection) -> StorageResult<Self> {
        let actual_version = current_user_version(conn)?;
        let expected_version = latest_version();
        if actual_version < expected_version {
            return Err(StorageError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if table_exists != 1 {
            return Err(StorageError::MissingRequiredTable(KV_TABLE));
        }

        Ok(Self {
            conn,
            quota_bytes: None,
        })
    }

    /// Limits total stored key and value bytes.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn quota_bytes(&self) -> Option<usize> {
        self.quota_bytes
    }
}

impl KeyValueStorage for SqliteStorage<'_> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let tx = rusqlite::Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if self.quota_bytes.is_some() {
            let other_entries_bytes: i64 = tx.query_row(
                "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
                 FROM kv_store
                 WHERE key <> ?1;",
                [key],
                |row| row.get(0),
            )?;
            let other_entries_bytes = usize::try_from(other_entries_bytes).unwrap_or(usize::MAX);
            check_quota(key, other_entries_bytes, value, self.quota_bytes)?;
        }

        tx.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStorage;
    use crate::db::open_db_in_memory;
    use crate::storage::{KeyValueStorage, StorageError};
    use rusqlite::Connection;

    #[test]
    fn upsert_replaces_existing_value() {
        let conn = open_db_in_memory().unwrap();
        let storage = SqliteStorage::try_new(&conn).unwrap();

        storage.set_item("appointments", "[]").unwrap();
        storage.set_item("appointments", "[1]").unwrap();

        assert_eq!(
            storage.get_item("appointments").unwrap().as_deref(),
            Some("[1]")
        );
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn quota_rejection_keeps_previous_value() {
        let conn = open_db_in_memory().unwrap();
        let storage = SqliteStorage::try_new(&conn).unwrap().with_quota(16);

        storage.set_item("k", "short").unwrap();
        let err = storage.set_item("k", "much longer value").unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();

        match SqliteStorage::try_new(&conn) {
            Err(StorageError::UninitializedConnection {
                expected_version,
                actual_version: 0,
            }) => assert!(expected_version > 0),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected uninitialized connection error"),
        }
    }
}
