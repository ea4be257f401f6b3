//! Device-local key/value storage abstractions and implementations.
//!
//! # Responsibility
//! - Define the `get_item`/`set_item` capability the appointment store needs.
//! - Isolate SQLite and in-memory details from store orchestration.
//!
//! # Invariants
//! - Values are opaque UTF-8 text; backends never interpret them.
//! - A write either replaces the whole value or leaves the old one intact.
//! - Quota checks count key and value bytes across the whole backend.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by key/value storage backends.
#[derive(Debug)]
pub enum StorageError {
    /// Backend is disabled or otherwise refuses access.
    Unavailable(String),
    /// Write would grow the backend past its configured byte quota.
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        quota_bytes: usize,
    },
    Db(DbError),
    /// Connection has not been migrated to the expected schema.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {required_bytes} bytes required, quota is {quota_bytes}"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "storage connection is not initialized: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "storage connection is missing required table `{table}`")
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key/value capability backing the appointment store.
pub trait KeyValueStorage {
    /// Returns the stored value, or `None` when the key was never written.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }
}

pub(crate) fn check_quota(
    key: &str,
    other_entries_bytes: usize,
    value: &str,
    quota_bytes: Option<usize>,
) -> StorageResult<()> {
    let Some(quota_bytes) = quota_bytes else {
        return Ok(());
    };
    let required_bytes = other_entries_bytes + key.len() + value.len();
    if required_bytes > quota_bytes {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            required_bytes,
            quota_bytes,
        });
    }
    Ok(())
}
