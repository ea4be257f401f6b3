//! Booking use-case service.
//!
//! # Responsibility
//! - Run the submit flow: validate, append, report.
//! - Provide the listing used on the landing view.
//! - Translate outcomes into user-facing notices.
//!
//! # Invariants
//! - Validation failures never reach storage.
//! - Write failures are never reported as success.

use crate::model::appointment::Appointment;
use crate::model::form::{validate_candidate, AppointmentForm, ValidatedAppointment};
use crate::model::validation::ValidationErrors;
use crate::storage::KeyValueStorage;
use crate::store::appointment_store::{AppointmentStore, PersistenceError};
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const BOOKED_TITLE: &str = "Appointment Booked Successfully!";
pub const BOOKED_DESCRIPTION: &str = "Your appointment has been confirmed.";
pub const FAILED_TITLE: &str = "Error";
pub const FAILED_DESCRIPTION: &str = "Failed to book appointment. Please try again.";
pub const INVALID_TITLE: &str = "Please fix the highlighted fields";

/// Submission failure returned to the presentation layer.
#[derive(Debug)]
pub enum BookingError {
    /// Input was rejected; the form should show every field error.
    Validation(ValidationErrors),
    /// Input was valid but could not be saved; the user may retry.
    Persistence(PersistenceError),
}

impl BookingError {
    /// Whether resubmitting the same input may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Persistence(_) => None,
        }
    }

    /// Notice to show the user for this failure.
    pub fn notice(&self) -> BookingNotice {
        match self {
            Self::Validation(errors) => BookingNotice {
                title: INVALID_TITLE.to_string(),
                description: format!("{} field(s) need attention.", errors.len()),
                destructive: true,
            },
            Self::Persistence(_) => BookingNotice {
                title: FAILED_TITLE.to_string(),
                description: FAILED_DESCRIPTION.to_string(),
                destructive: true,
            },
        }
    }
}

impl Display for BookingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ValidationErrors> for BookingError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for BookingError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingNotice {
    pub title: String,
    pub description: String,
    /// Rendered as an error when `true`.
    pub destructive: bool,
}

impl BookingNotice {
    pub fn booked() -> Self {
        Self {
            title: BOOKED_TITLE.to_string(),
            description: BOOKED_DESCRIPTION.to_string(),
            destructive: false,
        }
    }
}

/// Booking flow over an appointment store.
pub struct BookingService<S: KeyValueStorage> {
    store: AppointmentStore<S>,
}

impl<S: KeyValueStorage> BookingService<S> {
    pub fn new(store: AppointmentStore<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AppointmentStore<S> {
        &self.store
    }

    /// Lists appointments for the landing view, in insertion order.
    pub fn list_appointments(&self) -> Vec<Appointment> {
        self.store.list_all()
    }

    /// Validates and stores typed form input.
    pub fn submit(&self, form: &AppointmentForm) -> Result<Appointment, BookingError> {
        self.book(form.validate())
    }

    /// Validates and stores untyped form input.
    pub fn submit_candidate(&self, candidate: &Value) -> Result<Appointment, BookingError> {
        self.book(validate_candidate(candidate))
    }

    fn book(
        &self,
        validated: Result<ValidatedAppointment, ValidationErrors>,
    ) -> Result<Appointment, BookingError> {
        let validated = match validated {
            Ok(validated) => validated,
            Err(errors) => {
                let fields = errors
                    .errors()
                    .iter()
                    .map(|error| error.field.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                info!(
                    "event=booking_submit module=service status=rejected error_count={} fields={}",
                    errors.len(),
                    fields
                );
                return Err(errors.into());
            }
        };

        match self.store.append(validated) {
            Ok(appointment) => {
                info!(
                    "event=booking_submit module=service status=ok appointment_id={} reservation_type={}",
                    appointment.id, appointment.reservation_type
                );
                Ok(appointment)
            }
            Err(err) => {
                warn!(
                    "event=booking_submit module=service status=error error_code=persistence_failed"
                );
                Err(err.into())
            }
        }
    }
}
