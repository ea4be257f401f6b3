//! Core domain logic for Appointly.
//! This crate is the single source of truth for booking invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;
pub mod view;

pub use config::{AppointlyConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::appointment::{Appointment, AppointmentId, ReservationType};
pub use model::form::{validate_candidate, AppointmentForm, ValidatedAppointment};
pub use model::validation::{
    AppointmentField, FieldError, ValidationErrorKind, ValidationErrors,
};
pub use service::booking_service::{BookingError, BookingNotice, BookingService};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};
pub use store::appointment_store::{
    AppointmentStore, PersistenceError, PersistenceResult, DEFAULT_STORAGE_KEY,
};
pub use view::appointment_view::{AppointmentCardView, AppointmentDetailsView, EMPTY_LIST_MESSAGE};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
