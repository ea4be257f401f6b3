//! Field-level validation errors for booking input.
//!
//! # Responsibility
//! - Name every validated field with its stable wire name.
//! - Carry the complete set of failures for one submission.
//!
//! # Invariants
//! - A `ValidationErrors` value is never empty.
//! - Errors keep field declaration order so callers render them stably.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Booking fields addressable by validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppointmentField {
    Id,
    ReservationType,
    Date,
    Time,
    ContactName,
    Email,
    Phone,
    NumberOfPeople,
    VehiclePlate,
    VehicleModel,
}

impl AppointmentField {
    /// Wire name as used by form input and persisted JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::ReservationType => "reservationType",
            Self::Date => "date",
            Self::Time => "time",
            Self::ContactName => "contactName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::NumberOfPeople => "numberOfPeople",
            Self::VehiclePlate => "vehiclePlate",
            Self::VehicleModel => "vehicleModel",
        }
    }
}

impl Display for AppointmentField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of one field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required value is absent or empty.
    MissingField,
    /// Value is not one of the recognized tags.
    InvalidEnum,
    /// Value is shorter than the field minimum.
    TooShort,
    /// Value does not match the expected grammar or JSON type.
    InvalidFormat,
    /// Numeric value is not a whole number within bounds.
    OutOfRange,
}

impl ValidationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidEnum => "invalid_enum",
            Self::TooShort => "too_short",
            Self::InvalidFormat => "invalid_format",
            Self::OutOfRange => "out_of_range",
        }
    }
}

/// One field-level validation failure with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: AppointmentField,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: AppointmentField,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.kind.as_str(), self.message)
    }
}

/// Complete set of field failures for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        debug_assert!(!errors.is_empty(), "validation errors must not be empty");
        Self { errors }
    }

    pub(crate) fn nil_id() -> Self {
        Self {
            errors: vec![FieldError::new(
                AppointmentField::Id,
                ValidationErrorKind::InvalidFormat,
                "Appointment id must not be nil",
            )],
        }
    }

    pub(crate) fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the failures reported for one field.
    pub fn for_field(&self, field: AppointmentField) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |error| error.field == field)
    }

    /// Returns whether `field` failed with `kind`.
    pub fn has(&self, field: AppointmentField, kind: ValidationErrorKind) -> bool {
        self.for_field(field).any(|error| error.kind == kind)
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid appointment input: ")?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
