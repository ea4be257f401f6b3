//! Appointment store: read-all and append over one storage key.
//!
//! # Responsibility
//! - Decode the stored JSON array of appointments in insertion order.
//! - Assign identity and creation time, then rewrite the full array.
//!
//! # Invariants
//! - `list_all` never fails; absent, unreadable or corrupted data reads as
//!   an empty list and is logged at `warn`.
//! - Only a value that is not a JSON array counts as corrupted. Entries of a
//!   readable array that do not decode, or repeat an earlier id, are skipped
//!   by `list_all` and logged by position.
//! - `append` rewrites every existing array entry verbatim, including the
//!   ones `list_all` skips; only a corrupted value is replaced.
//! - `append` refuses to rewrite when the current value cannot be read, so a
//!   transient storage failure never wipes existing bookings.
//! - `append` assigns an id not present in the current collection.

use crate::model::appointment::{Appointment, AppointmentId};
use crate::model::form::ValidatedAppointment;
use crate::storage::{KeyValueStorage, StorageError};
use chrono::Utc;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Storage key used when callers do not pick a namespace.
pub const DEFAULT_STORAGE_KEY: &str = "appointments";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Failure to persist (or safely prepare to persist) the collection.
#[derive(Debug)]
pub enum PersistenceError {
    /// Backend read or write failed.
    Storage(StorageError),
    /// Collection could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "failed to save appointment: {err}"),
            Self::Encode(err) => write!(f, "failed to encode appointments: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

#[derive(Debug)]
enum ReadFailure {
    Storage(StorageError),
    Corrupted(Corruption),
}

/// Stored value is not a JSON array. Carries no contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Corruption;

impl Display for Corruption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "reason=not_a_json_array")
    }
}

/// Why a readable array entry is left out of `list_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Undecodable,
    DuplicateId,
}

impl SkipReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Undecodable => "undecodable",
            Self::DuplicateId => "duplicate_id",
        }
    }
}

/// Decoded view of the stored array.
#[derive(Debug)]
struct StoredCollection {
    /// Every stored entry, as written.
    entries: Vec<Value>,
    /// Entries that decode, first occurrence per id, in stored order.
    appointments: Vec<Appointment>,
    skipped: Vec<(usize, SkipReason)>,
    /// Positions of decoded entries that no longer pass form rules.
    flagged: Vec<usize>,
}

impl StoredCollection {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            appointments: Vec::new(),
            skipped: Vec::new(),
            flagged: Vec::new(),
        }
    }

    /// Ids held by any entry, decodable or not.
    fn taken_ids(&self) -> HashSet<AppointmentId> {
        self.entries
            .iter()
            .filter_map(|entry| entry.get("id").and_then(Value::as_str))
            .filter_map(|raw| Uuid::parse_str(raw).ok())
            .collect()
    }
}

/// Append-only appointment collection stored under one key.
pub struct AppointmentStore<S: KeyValueStorage> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> AppointmentStore<S> {
    /// Creates a store using `DEFAULT_STORAGE_KEY`.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns every stored appointment in insertion order.
    ///
    /// Returns an empty list when storage is absent, unreadable or corrupted.
    /// Array entries that do not decode are left out.
    pub fn list_all(&self) -> Vec<Appointment> {
        match self.load() {
            Ok(collection) => {
                log_skipped(&self.key, "list", &collection);
                collection.appointments
            }
            Err(failure) => {
                log_read_failure(&self.key, "list", &failure);
                Vec::new()
            }
        }
    }

    /// Stores a validated appointment and returns the materialized record.
    ///
    /// Existing entries are written back unchanged. A corrupted stored value
    /// is treated as empty and replaced.
    ///
    /// # Errors
    /// - `PersistenceError::Storage` when the current value cannot be read or
    ///   the rewritten collection cannot be written.
    /// - `PersistenceError::Encode` when the collection cannot be encoded.
    pub fn append(&self, validated: ValidatedAppointment) -> PersistenceResult<Appointment> {
        let started_at = Instant::now();

        let collection = match self.load() {
            Ok(collection) => {
                log_skipped(&self.key, "append", &collection);
                collection
            }
            Err(failure @ ReadFailure::Corrupted(_)) => {
                log_read_failure(&self.key, "append", &failure);
                StoredCollection::empty()
            }
            Err(ReadFailure::Storage(err)) => {
                error!(
                    "event=appointment_append module=store status=error key={} duration_ms={} error_code=storage_read_failed error={}",
                    self.key,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        let id = fresh_id(&collection.taken_ids());
        let appointment = validated.into_appointment(id, Utc::now());
        let mut entries = collection.entries;

        let result = serde_json::to_value(&appointment)
            .and_then(|entry| {
                entries.push(entry);
                serde_json::to_string(&entries)
            })
            .map_err(PersistenceError::from)
            .and_then(|encoded| {
                self.storage
                    .set_item(&self.key, &encoded)
                    .map_err(PersistenceError::from)
            });

        match result {
            Ok(()) => {
                info!(
                    "event=appointment_append module=store status=ok key={} appointment_id={} count={} duration_ms={}",
                    self.key,
                    appointment.id,
                    entries.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(appointment)
            }
            Err(err) => {
                error!(
                    "event=appointment_append module=store status=error key={} duration_ms={} error_code=storage_write_failed error={}",
                    self.key,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn load(&self) -> Result<StoredCollection, ReadFailure> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(StoredCollection::empty()),
            Err(err) => return Err(ReadFailure::Storage(err)),
        };
        decode_collection(&raw).map_err(ReadFailure::Corrupted)
    }
}

fn decode_collection(raw: &str) -> Result<StoredCollection, Corruption> {
    if raw.trim().is_empty() {
        return Ok(StoredCollection::empty());
    }

    let entries: Vec<Value> = serde_json::from_str(raw).map_err(|_| Corruption)?;

    let mut collection = StoredCollection::empty();
    let mut seen = HashSet::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let appointment = match Appointment::deserialize(entry) {
            Ok(appointment) => appointment,
            Err(_) => {
                collection.skipped.push((index, SkipReason::Undecodable));
                continue;
            }
        };
        if !seen.insert(appointment.id) {
            collection.skipped.push((index, SkipReason::DuplicateId));
            continue;
        }
        if appointment.validate().is_err() {
            collection.flagged.push(index);
        }
        collection.appointments.push(appointment);
    }
    collection.entries = entries;

    Ok(collection)
}

fn fresh_id(taken: &HashSet<AppointmentId>) -> AppointmentId {
    loop {
        let candidate = Uuid::new_v4();
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

fn log_read_failure(key: &str, operation: &str, failure: &ReadFailure) {
    match failure {
        ReadFailure::Storage(err) => warn!(
            "event=appointment_read module=store status=degraded key={} op={} error_code=storage_read_failed error={}",
            key, operation, err
        ),
        ReadFailure::Corrupted(corruption) => warn!(
            "event=appointment_read module=store status=degraded key={} op={} error_code=stored_data_corrupted {}",
            key, operation, corruption
        ),
    }
}

fn log_skipped(key: &str, operation: &str, collection: &StoredCollection) {
    for (index, reason) in &collection.skipped {
        warn!(
            "event=appointment_read module=store status=degraded key={} op={} error_code=entry_skipped index={} reason={}",
            key,
            operation,
            index,
            reason.as_str()
        );
    }
    if !collection.flagged.is_empty() {
        warn!(
            "event=appointment_read module=store status=ok key={} op={} flagged_entries={:?}",
            key, operation, collection.flagged
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_collection, Corruption, SkipReason};

    const RECORD: &str = r#"{
        "id": "11111111-2222-4333-8444-555555555555",
        "reservationType": "organization",
        "date": "2025-01-10",
        "time": "14:00",
        "contactName": "Acme",
        "email": "ops@acme.io",
        "phone": "5551234567",
        "createdAt": "2025-01-02T09:30:00Z"
    }"#;

    #[test]
    fn decode_treats_blank_value_as_empty() {
        assert!(decode_collection("   ").unwrap().entries.is_empty());
        assert!(decode_collection("[]").unwrap().appointments.is_empty());
    }

    #[test]
    fn decode_rejects_only_non_arrays() {
        assert_eq!(decode_collection("{\"id\":1}").unwrap_err(), Corruption);
        assert_eq!(decode_collection("not json").unwrap_err(), Corruption);
        assert!(decode_collection("[1, 2]").is_ok());
    }

    #[test]
    fn decode_skips_undecodable_entries_but_keeps_them() {
        let raw = format!("[{{\"id\":\"abc\"}}, {RECORD}, 7]");
        let collection = decode_collection(&raw).unwrap();

        assert_eq!(collection.entries.len(), 3);
        assert_eq!(collection.appointments.len(), 1);
        assert_eq!(
            collection.skipped,
            vec![(0, SkipReason::Undecodable), (2, SkipReason::Undecodable)]
        );
    }

    #[test]
    fn decode_skips_repeated_ids() {
        let raw = format!("[{RECORD},{RECORD}]");
        let collection = decode_collection(&raw).unwrap();

        assert_eq!(collection.appointments.len(), 1);
        assert_eq!(collection.skipped, vec![(1, SkipReason::DuplicateId)]);
        assert_eq!(collection.taken_ids().len(), 1);
    }

    #[test]
    fn decode_lists_records_that_fail_form_rules() {
        let raw = RECORD.replace("ops@acme.io", "nope");
        let collection = decode_collection(&format!("[{raw}]")).unwrap();

        assert_eq!(collection.appointments.len(), 1);
        assert_eq!(collection.flagged, vec![0]);
    }
}
