//! Booking form input and validation rules.
//!
//! # Responsibility
//! - Accept typed (`AppointmentForm`) or untyped JSON booking candidates.
//! - Produce a normalized `ValidatedAppointment`, or every field failure.
//!
//! # Invariants
//! - `ValidatedAppointment` can only be built by passing validation.
//! - Validation reports all failing fields, not just the first.
//! - `reservation_type` must match a wire tag exactly; no trimming.
//! - `date` and `time` are kept as supplied; other required text is trimmed.
//! - Whitespace-only required text is missing; optional text that trims to
//!   empty is absent.
//! - `number_of_people` is dropped for organization bookings.

use crate::model::appointment::{Appointment, AppointmentId, ReservationType};
use crate::model::validation::{
    AppointmentField, FieldError, ValidationErrorKind, ValidationErrors,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Minimum contact name length, in characters.
pub const CONTACT_NAME_MIN_CHARS: usize = 2;
/// Minimum phone length, in characters; digits and punctuation both count.
pub const PHONE_MIN_CHARS: usize = 10;
/// Smallest accepted party size.
pub const NUMBER_OF_PEOPLE_MIN: i64 = 1;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@(?:[a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
        .expect("valid email regex")
});

/// Raw booking form input. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub reservation_type: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub number_of_people: Option<i64>,
    pub vehicle_plate: Option<String>,
    pub vehicle_model: Option<String>,
}

impl AppointmentForm {
    /// Returns the initial state of a fresh booking form.
    ///
    /// Reservation type starts as `individual`; text fields start empty.
    pub fn with_defaults() -> Self {
        Self {
            reservation_type: Some(ReservationType::Individual.as_str().to_string()),
            date: Some(String::new()),
            time: Some(String::new()),
            contact_name: Some(String::new()),
            email: Some(String::new()),
            phone: Some(String::new()),
            number_of_people: None,
            vehicle_plate: Some(String::new()),
            vehicle_model: Some(String::new()),
        }
    }

    /// Validates this form and normalizes it for storage.
    ///
    /// # Errors
    /// - Returns every field failure when any rule is violated.
    pub fn validate(&self) -> Result<ValidatedAppointment, ValidationErrors> {
        let reservation_type = check_reservation_type(self.reservation_type.as_deref());
        let date = check_supplied(AppointmentField::Date, self.date.as_deref(), "Date is required");
        let time = check_supplied(AppointmentField::Time, self.time.as_deref(), "Time is required");
        let contact_name = check_contact_name(self.contact_name.as_deref());
        let email = check_email(self.email.as_deref());
        let phone = check_phone(self.phone.as_deref());
        let number_of_people = check_number_of_people(self.number_of_people);

        match (
            reservation_type,
            date,
            time,
            contact_name,
            email,
            phone,
            number_of_people,
        ) {
            (
                Ok(reservation_type),
                Ok(date),
                Ok(time),
                Ok(contact_name),
                Ok(email),
                Ok(phone),
                Ok(number_of_people),
            ) => Ok(ValidatedAppointment {
                reservation_type,
                date,
                time,
                contact_name,
                email,
                phone,
                number_of_people: match reservation_type {
                    ReservationType::Individual => number_of_people,
                    ReservationType::Organization => None,
                },
                vehicle_plate: normalize_optional_text(self.vehicle_plate.as_deref()),
                vehicle_model: normalize_optional_text(self.vehicle_model.as_deref()),
            }),
            (reservation_type, date, time, contact_name, email, phone, number_of_people) => {
                let errors = [
                    reservation_type.err(),
                    date.err(),
                    time.err(),
                    contact_name.err(),
                    email.err(),
                    phone.err(),
                    number_of_people.err(),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
                Err(ValidationErrors::new(errors))
            }
        }
    }
}

/// Validates a structurally untyped candidate, e.g. submitted form JSON.
///
/// Fields present with the wrong JSON type fail with `InvalidFormat`
/// (text fields) or `OutOfRange` (`numberOfPeople`); `null` counts as absent.
/// A non-object candidate fails every required field.
pub fn validate_candidate(candidate: &Value) -> Result<ValidatedAppointment, ValidationErrors> {
    let empty = Map::new();
    let object = candidate.as_object().unwrap_or(&empty);
    let mut type_errors = Vec::new();

    let form = AppointmentForm {
        reservation_type: read_text(object, AppointmentField::ReservationType, &mut type_errors),
        date: read_text(object, AppointmentField::Date, &mut type_errors),
        time: read_text(object, AppointmentField::Time, &mut type_errors),
        contact_name: read_text(object, AppointmentField::ContactName, &mut type_errors),
        email: read_text(object, AppointmentField::Email, &mut type_errors),
        phone: read_text(object, AppointmentField::Phone, &mut type_errors),
        number_of_people: read_whole_number(object, &mut type_errors),
        vehicle_plate: read_text(object, AppointmentField::VehiclePlate, &mut type_errors),
        vehicle_model: read_text(object, AppointmentField::VehicleModel, &mut type_errors),
    };

    let rule_errors = match form.validate() {
        Ok(validated) if type_errors.is_empty() => return Ok(validated),
        Ok(_) => Vec::new(),
        Err(errors) => errors.into_errors(),
    };

    // A mistyped field is read as absent; drop the resulting MissingField.
    let mut errors = rule_errors
        .into_iter()
        .filter(|error| type_errors.iter().all(|typed| typed.field != error.field))
        .collect::<Vec<_>>();
    errors.append(&mut type_errors);
    errors.sort_by_key(|error| error.field);

    Err(ValidationErrors::new(errors))
}

/// Booking input that passed validation and is ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAppointment {
    reservation_type: ReservationType,
    date: String,
    time: String,
    contact_name: String,
    email: String,
    phone: String,
    number_of_people: Option<u32>,
    vehicle_plate: Option<String>,
    vehicle_model: Option<String>,
}

impl ValidatedAppointment {
    pub fn reservation_type(&self) -> ReservationType {
        self.reservation_type
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn contact_name(&self) -> &str {
        &self.contact_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn number_of_people(&self) -> Option<u32> {
        self.number_of_people
    }

    pub fn vehicle_plate(&self) -> Option<&str> {
        self.vehicle_plate.as_deref()
    }

    pub fn vehicle_model(&self) -> Option<&str> {
        self.vehicle_model.as_deref()
    }

    /// Materializes the stored record with store-assigned identity.
    pub(crate) fn into_appointment(
        self,
        id: AppointmentId,
        created_at: DateTime<Utc>,
    ) -> Appointment {
        Appointment {
            id,
            reservation_type: self.reservation_type,
            date: self.date,
            time: self.time,
            contact_name: self.contact_name,
            email: self.email,
            phone: self.phone,
            number_of_people: self.number_of_people,
            vehicle_plate: self.vehicle_plate,
            vehicle_model: self.vehicle_model,
            created_at,
        }
    }
}

/// Returns whether `value` matches the accepted email grammar.
pub fn is_valid_email(value: &str) -> bool {
    !value.starts_with('.') && !value.contains("..") && EMAIL_RE.is_match(value)
}

fn check_reservation_type(value: Option<&str>) -> Result<ReservationType, FieldError> {
    let field = AppointmentField::ReservationType;
    match value.filter(|tag| !tag.trim().is_empty()) {
        None => Err(FieldError::new(
            field,
            ValidationErrorKind::MissingField,
            "Please select a reservation type",
        )),
        Some(tag) => ReservationType::parse(tag).ok_or_else(|| {
            FieldError::new(
                field,
                ValidationErrorKind::InvalidEnum,
                "Reservation type must be individual or organization",
            )
        }),
    }
}

fn check_required(
    field: AppointmentField,
    value: Option<&str>,
    message: &'static str,
) -> Result<String, FieldError> {
    non_empty(value)
        .map(str::to_string)
        .ok_or_else(|| FieldError::new(field, ValidationErrorKind::MissingField, message))
}

/// Like `check_required`, but returns the text untrimmed.
fn check_supplied(
    field: AppointmentField,
    value: Option<&str>,
    message: &'static str,
) -> Result<String, FieldError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(FieldError::new(field, ValidationErrorKind::MissingField, message)),
    }
}

fn check_contact_name(value: Option<&str>) -> Result<String, FieldError> {
    let field = AppointmentField::ContactName;
    let name = check_required(field, value, "Name is required")?;
    if name.chars().count() < CONTACT_NAME_MIN_CHARS {
        return Err(FieldError::new(
            field,
            ValidationErrorKind::TooShort,
            "Name must be at least 2 characters",
        ));
    }
    Ok(name)
}

fn check_email(value: Option<&str>) -> Result<String, FieldError> {
    let field = AppointmentField::Email;
    let email = check_required(field, value, "Email is required")?;
    if !is_valid_email(&email) {
        return Err(FieldError::new(
            field,
            ValidationErrorKind::InvalidFormat,
            "Please enter a valid email address",
        ));
    }
    Ok(email)
}

fn check_phone(value: Option<&str>) -> Result<String, FieldError> {
    let field = AppointmentField::Phone;
    let phone = check_required(field, value, "Phone number is required")?;
    if phone.chars().count() < PHONE_MIN_CHARS {
        return Err(FieldError::new(
            field,
            ValidationErrorKind::TooShort,
            "Phone number must be at least 10 digits",
        ));
    }
    Ok(phone)
}

fn check_number_of_people(value: Option<i64>) -> Result<Option<u32>, FieldError> {
    match value {
        None => Ok(None),
        Some(count) if count >= NUMBER_OF_PEOPLE_MIN => u32::try_from(count)
            .map(Some)
            .map_err(|_| out_of_range_people()),
        Some(_) => Err(out_of_range_people()),
    }
}

fn out_of_range_people() -> FieldError {
    FieldError::new(
        AppointmentField::NumberOfPeople,
        ValidationErrorKind::OutOfRange,
        "Number of people must be at least 1",
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

fn read_text(
    object: &Map<String, Value>,
    field: AppointmentField,
    type_errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(field.as_str()) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            type_errors.push(FieldError::new(
                field,
                ValidationErrorKind::InvalidFormat,
                format!("{field} must be text"),
            ));
            None
        }
    }
}

fn read_whole_number(
    object: &Map<String, Value>,
    type_errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let field = AppointmentField::NumberOfPeople;
    let whole = match object.get(field.as_str()) {
        None | Some(Value::Null) => return None,
        Some(Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                .map(|value| value as i64)
        }),
        Some(_) => None,
    };

    if whole.is_none() {
        type_errors.push(FieldError::new(
            field,
            ValidationErrorKind::OutOfRange,
            "Number of people must be a whole number",
        ));
    }
    whole
}
