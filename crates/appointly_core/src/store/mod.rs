//! Durable appointment collection over injected key/value storage.
//!
//! # Responsibility
//! - Own the namespaced storage key holding every booking record.
//! - Expose read-all and append; nothing else.
//!
//! # Invariants
//! - Reads degrade to an empty list; writes surface `PersistenceError`.
//! - Appends rewrite the full collection (last writer wins across processes).

pub mod appointment_store;
