//! Appointment (booking record) domain model.
//!
//! # Responsibility
//! - Define the persisted booking record and its JSON wire shape.
//! - Re-check persisted records against the same rules used for form input.
//!
//! # Invariants
//! - `id` is stable and never reused for another appointment.
//! - `id` and `created_at` are assigned by the store, never by callers.
//! - Optional text fields are `None` rather than empty strings.

use crate::model::form::AppointmentForm;
use crate::model::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one booking record.
pub type AppointmentId = Uuid;

/// Who the appointment is booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    /// A single person, optionally with a party size.
    Individual,
    /// A company or group booking.
    Organization,
}

impl ReservationType {
    /// Wire tag used in form input and persisted JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Organization => "organization",
        }
    }

    /// Parses an exact wire tag. Matching is case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "individual" => Some(Self::Individual),
            "organization" => Some(Self::Organization),
            _ => None,
        }
    }
}

impl Display for ReservationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical persisted booking record.
///
/// Field names serialize in camelCase so the stored JSON array keeps the
/// layout written by earlier clients of the same storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub reservation_type: ReservationType,
    /// Calendar date exactly as entered, e.g. `2025-01-10`.
    pub date: String,
    /// Clock time exactly as entered, e.g. `14:00`.
    pub time: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    /// Party size; only kept for `ReservationType::Individual`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_people: Option<u32>,
    #[serde(
        default,
        deserialize_with = "empty_text_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub vehicle_plate: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_text_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub vehicle_model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Re-validates a materialized record with the form rules.
    ///
    /// Used on read paths to flag hand-edited or foreign data in storage.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = AppointmentForm::from(self).validate().err();
        if self.id.is_nil() {
            let nil_id = ValidationErrors::nil_id();
            errors = Some(match errors {
                Some(mut existing) => {
                    existing.extend(nil_id);
                    existing
                }
                None => nil_id,
            });
        }
        match errors {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    /// Returns whether the party size is meaningful for this booking.
    pub fn is_individual(&self) -> bool {
        self.reservation_type == ReservationType::Individual
    }
}

impl From<&Appointment> for AppointmentForm {
    fn from(value: &Appointment) -> Self {
        Self {
            reservation_type: Some(value.reservation_type.as_str().to_string()),
            date: Some(value.date.clone()),
            time: Some(value.time.clone()),
            contact_name: Some(value.contact_name.clone()),
            email: Some(value.email.clone()),
            phone: Some(value.phone.clone()),
            number_of_people: value.number_of_people.map(i64::from),
            vehicle_plate: value.vehicle_plate.clone(),
            vehicle_model: value.vehicle_model.clone(),
        }
    }
}

fn empty_text_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::{Appointment, ReservationType};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample() -> Appointment {
        Appointment {
            id: Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap(),
            reservation_type: ReservationType::Individual,
            date: "2025-01-10".to_string(),
            time: "14:00".to_string(),
            contact_name: "Jo Lee".to_string(),
            email: "jo@example.com".to_string(),
            phone: "5551234567".to_string(),
            number_of_people: Some(2),
            vehicle_plate: Some("ABC-123".to_string()),
            vehicle_model: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn reservation_type_parse_is_exact() {
        assert_eq!(
            ReservationType::parse("organization"),
            Some(ReservationType::Organization)
        );
        assert_eq!(ReservationType::parse("Individual"), None);
        assert_eq!(ReservationType::Individual.to_string(), "individual");
    }

    #[test]
    fn serialization_uses_camel_case_and_omits_absent_optionals() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["reservationType"], "individual");
        assert_eq!(json["contactName"], "Jo Lee");
        assert_eq!(json["numberOfPeople"], 2);
        assert_eq!(json["vehiclePlate"], "ABC-123");
        assert!(json.get("vehicleModel").is_none());
        assert_eq!(json["createdAt"], "2025-01-02T09:30:00Z");
    }

    #[test]
    fn deserialize_accepts_browser_written_records() {
        let value = serde_json::json!({
            "id": "11111111-2222-4333-8444-555555555555",
            "reservationType": "organization",
            "date": "2025-03-01",
            "time": "09:15",
            "contactName": "Acme Fleet",
            "email": "fleet@acme.io",
            "phone": "+1 555 000 1111",
            "vehiclePlate": "",
            "vehicleModel": "Transit",
            "createdAt": "2025-02-20T10:11:12.345Z"
        });

        let decoded: Appointment = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.reservation_type, ReservationType::Organization);
        assert_eq!(decoded.vehicle_plate, None);
        assert_eq!(decoded.vehicle_model.as_deref(), Some("Transit"));
        assert_eq!(decoded.number_of_people, None);
        assert!(decoded.validate().is_ok());
    }

    #[test]
    fn validate_flags_nil_id_and_bad_fields() {
        let mut record = sample();
        record.id = Uuid::nil();
        record.email = "broken".to_string();

        let errors = record.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
