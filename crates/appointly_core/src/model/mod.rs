//! Booking domain model.
//!
//! # Responsibility
//! - Define the canonical booking record persisted by the store.
//! - Define form input and the validation contract that guards every write.
//!
//! # Invariants
//! - Every stored record is identified by a stable `AppointmentId`.
//! - Records are append-only; there is no update or delete lifecycle.

pub mod appointment;
pub mod form;
pub mod validation;
