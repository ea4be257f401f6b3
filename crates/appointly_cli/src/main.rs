//! CLI entry point for local booking checks.
//!
//! # Responsibility
//! - Verify `appointly_core` linkage (`appointly_cli` with no arguments).
//! - List, book and inspect appointments against the configured database.
//!
//! Usage:
//! - `appointly_cli list`
//! - `appointly_cli book reservationType=individual date=2025-01-10 ...`
//! - `appointly_cli show <appointment-id>`

use appointly_core::db::open_db;
use appointly_core::{
    AppointlyConfig, AppointmentCardView, AppointmentDetailsView, AppointmentForm,
    AppointmentStore, BookingService, SqliteStorage, EMPTY_LIST_MESSAGE,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let Some((command, rest)) = args.split_first() else {
        println!("appointly_core ping={}", appointly_core::ping());
        println!("appointly_core version={}", appointly_core::core_version());
        return Ok(());
    };

    match command.as_str() {
        "list" => with_service(|service| {
            let appointments = service.list_appointments();
            if appointments.is_empty() {
                println!("{EMPTY_LIST_MESSAGE}");
            }
            for appointment in &appointments {
                let card = AppointmentCardView::from(appointment);
                println!(
                    "{}  {}  {}  {}  {}",
                    card.id,
                    card.title,
                    card.status_label,
                    card.schedule_label,
                    card.vehicle_plate.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }),
        "book" => {
            let form = parse_form(rest)?;
            with_service(|service| match service.submit(&form) {
                Ok(appointment) => {
                    let notice = appointly_core::BookingNotice::booked();
                    println!("{}: {}", notice.title, notice.description);
                    println!("id={}", appointment.id);
                    Ok(())
                }
                Err(err) => {
                    let notice = err.notice();
                    let mut message = format!("{}: {}", notice.title, notice.description);
                    if let Some(errors) = err.validation_errors() {
                        for error in errors {
                            message.push_str(&format!(
                                "\n  {}: {}",
                                error.field.as_str(),
                                error.message
                            ));
                        }
                    }
                    Err(message)
                }
            })
        }
        "show" => {
            let id = rest
                .first()
                .ok_or_else(|| "usage: appointly_cli show <appointment-id>".to_string())?;
            with_service(|service| {
                let details = service
                    .list_appointments()
                    .iter()
                    .find(|appointment| appointment.id.to_string() == id.trim())
                    .map(AppointmentDetailsView::from)
                    .ok_or_else(|| format!("appointment `{id}` not found"))?;
                print_details(&details);
                Ok(())
            })
        }
        other => Err(format!(
            "unknown command `{other}`; expected list|book|show"
        )),
    }
}

fn with_service(
    f: impl FnOnce(&BookingService<SqliteStorage<'_>>) -> Result<(), String>,
) -> Result<(), String> {
    let config = AppointlyConfig::from_env().map_err(|err| err.to_string())?;
    let conn = open_db(&config.db_path).map_err(|err| format!("open db failed: {err}"))?;
    let mut storage =
        SqliteStorage::try_new(&conn).map_err(|err| format!("storage init failed: {err}"))?;
    if let Some(quota_bytes) = config.storage_quota_bytes {
        storage = storage.with_quota(quota_bytes);
    }
    let service = BookingService::new(AppointmentStore::with_key(storage, config.storage_key));
    f(&service)
}

fn parse_form(pairs: &[String]) -> Result<AppointmentForm, String> {
    let mut form = AppointmentForm::with_defaults();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got `{pair}`"))?;
        let value = value.to_string();
        match key {
            "reservationType" => form.reservation_type = Some(value),
            "date" => form.date = Some(value),
            "time" => form.time = Some(value),
            "contactName" => form.contact_name = Some(value),
            "email" => form.email = Some(value),
            "phone" => form.phone = Some(value),
            "numberOfPeople" => {
                let count = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("numberOfPeople must be a whole number, got `{value}`"))?;
                form.number_of_people = Some(count);
            }
            "vehiclePlate" => form.vehicle_plate = Some(value),
            "vehicleModel" => form.vehicle_model = Some(value),
            other => return Err(format!("unknown field `{other}`")),
        }
    }
    Ok(form)
}

fn print_details(details: &AppointmentDetailsView) {
    println!("id={}", details.id);
    println!("type={} status={}", details.type_label, details.status_label);
    println!("date={} time={}", details.date_label, details.time_label);
    println!("contact={} <{}> {}", details.contact_name, details.email, details.phone);
    if let Some(party_size) = &details.party_size_label {
        println!("party={party_size}");
    }
    if let Some(plate) = &details.vehicle_plate {
        println!("plate={plate}");
    }
    if let Some(model) = &details.vehicle_model {
        println!("model={model}");
    }
}

#[cfg(test)]
mod tests {
    use super::parse_form;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_form_maps_wire_names() {
        let form = parse_form(&args(&[
            "reservationType=organization",
            "contactName=Acme Fleet",
            "numberOfPeople=3",
            "vehiclePlate=ACME-01",
        ]))
        .unwrap();

        assert_eq!(form.reservation_type.as_deref(), Some("organization"));
        assert_eq!(form.contact_name.as_deref(), Some("Acme Fleet"));
        assert_eq!(form.number_of_people, Some(3));
        assert_eq!(form.vehicle_plate.as_deref(), Some("ACME-01"));
        assert_eq!(form.email.as_deref(), Some(""));
    }

    #[test]
    fn parse_form_rejects_malformed_arguments() {
        assert!(parse_form(&args(&["contactName"])).unwrap_err().contains("key=value"));
        assert!(parse_form(&args(&["nickname=Jo"])).unwrap_err().contains("unknown field"));
        assert!(parse_form(&args(&["numberOfPeople=two"]))
            .unwrap_err()
            .contains("whole number"));
    }
}
