//! Card and details projections for the appointment list.
//!
//! # Invariants
//! - Stored `date`/`time` strings are formatted when they parse as
//!   `YYYY-MM-DD` and `HH:MM[:SS]`; otherwise they are shown verbatim.
//! - Every stored appointment is shown as `Confirmed`.

use crate::model::appointment::{Appointment, ReservationType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Shown by the landing view when nothing has been booked yet.
pub const EMPTY_LIST_MESSAGE: &str = "No appointments found. Book a new one!";
pub const CONFIRMED_STATUS: &str = "Confirmed";

/// Short projection rendered as one card in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentCardView {
    pub id: String,
    /// `Individual Booking` or `Organization Booking`.
    pub title: String,
    pub type_label: String,
    pub status_label: String,
    /// e.g. `Fri, Jan 10, 02:00 PM`.
    pub schedule_label: String,
    pub vehicle_plate: Option<String>,
}

/// Full projection rendered by the details dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDetailsView {
    pub id: String,
    pub type_label: String,
    pub status_label: String,
    /// e.g. `Friday, January 10, 2025`.
    pub date_label: String,
    /// e.g. `02:00 PM`.
    pub time_label: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    /// e.g. `3 people`; only for individual bookings with a party size.
    pub party_size_label: Option<String>,
    pub vehicle_plate: Option<String>,
    pub vehicle_model: Option<String>,
}

pub fn reservation_type_label(kind: ReservationType) -> &'static str {
    match kind {
        ReservationType::Individual => "Individual",
        ReservationType::Organization => "Organization",
    }
}

impl From<&Appointment> for AppointmentCardView {
    fn from(value: &Appointment) -> Self {
        let type_label = reservation_type_label(value.reservation_type);
        Self {
            id: value.id.to_string(),
            title: format!("{type_label} Booking"),
            type_label: type_label.to_string(),
            status_label: CONFIRMED_STATUS.to_string(),
            schedule_label: format_schedule(&value.date, &value.time),
            vehicle_plate: value.vehicle_plate.clone(),
        }
    }
}

impl From<&Appointment> for AppointmentDetailsView {
    fn from(value: &Appointment) -> Self {
        let party_size_label = value
            .number_of_people
            .filter(|_| value.is_individual())
            .map(|count| match count {
                1 => "1 person".to_string(),
                count => format!("{count} people"),
            });

        Self {
            id: value.id.to_string(),
            type_label: reservation_type_label(value.reservation_type).to_string(),
            status_label: CONFIRMED_STATUS.to_string(),
            date_label: format_long_date(&value.date),
            time_label: format_clock_time(&value.time),
            contact_name: value.contact_name.clone(),
            email: value.email.clone(),
            phone: value.phone.clone(),
            party_size_label,
            vehicle_plate: value.vehicle_plate.clone(),
            vehicle_model: value.vehicle_model.clone(),
        }
    }
}

/// Formats date and time together, e.g. `Fri, Jan 10, 02:00 PM`.
pub fn format_schedule(date: &str, time: &str) -> String {
    match (parse_date(date), parse_time(time)) {
        (Some(date), Some(time)) => NaiveDateTime::new(date, time)
            .format("%a, %b %-d, %I:%M %p")
            .to_string(),
        _ => format!("{} {}", date.trim(), time.trim()).trim().to_string(),
    }
}

/// Formats a stored date, e.g. `Friday, January 10, 2025`.
pub fn format_long_date(date: &str) -> String {
    parse_date(date)
        .map(|date| date.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Formats a stored time, e.g. `02:00 PM`.
pub fn format_clock_time(time: &str) -> String {
    parse_time(time)
        .map(|time| time.format("%I:%M %p").to_string())
        .unwrap_or_else(|| time.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}
