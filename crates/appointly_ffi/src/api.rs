//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose listing, booking and details lookups to Dart via FRB.
//! - Flatten core results into string-typed envelopes for the UI.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Store access is serialized within the process, so each append's
//!   read-modify-write completes before the next one starts.
//! - A failed booking never reports `ok = true`.

use appointly_core::db::open_db;
use appointly_core::service::booking_service::{FAILED_DESCRIPTION, FAILED_TITLE};
use appointly_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppointlyConfig, AppointmentCardView, AppointmentDetailsView, AppointmentForm,
    AppointmentStore, BookingError, BookingNotice, BookingService, SqliteStorage,
    EMPTY_LIST_MESSAGE,
};
use log::warn;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

static CONFIG: OnceLock<Result<AppointlyConfig, String>> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); blank
///   falls back to `APPOINTLY_LOG_LEVEL` or the build-mode default.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        match resolve_config() {
            Ok(config) => config.log_level,
            Err(err) => return err,
        }
    } else {
        level
    };
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Booking form fields as entered in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFormInput {
    pub reservation_type: String,
    pub date: String,
    pub time: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub number_of_people: Option<i64>,
    pub vehicle_plate: String,
    pub vehicle_model: String,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFieldError {
    /// Wire field name, e.g. `contactName`.
    pub field: String,
    /// `missing_field|invalid_enum|too_short|invalid_format|out_of_range`.
    pub code: String,
    pub message: String,
}

/// Result envelope for one booking submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingResponse {
    pub ok: bool,
    pub appointment_id: Option<String>,
    /// Toast title.
    pub title: String,
    /// Toast description.
    pub message: String,
    /// Whether the user may resubmit the same input.
    pub retryable: bool,
    /// Empty unless the input failed validation.
    pub field_errors: Vec<BookingFieldError>,
}

impl BookingResponse {
    fn booked(appointment_id: Uuid) -> Self {
        let notice = BookingNotice::booked();
        Self {
            ok: true,
            appointment_id: Some(appointment_id.to_string()),
            title: notice.title,
            message: notice.description,
            retryable: false,
            field_errors: Vec::new(),
        }
    }

    fn rejected(err: &BookingError) -> Self {
        let notice = err.notice();
        let field_errors = err
            .validation_errors()
            .map(|errors| {
                errors
                    .errors()
                    .iter()
                    .map(|error| BookingFieldError {
                        field: error.field.as_str().to_string(),
                        code: error.kind.as_str().to_string(),
                        message: error.message.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            ok: false,
            appointment_id: None,
            title: notice.title,
            message: notice.description,
            retryable: err.is_retryable(),
            field_errors,
        }
    }

    fn unavailable() -> Self {
        Self {
            ok: false,
            appointment_id: None,
            title: FAILED_TITLE.to_string(),
            message: FAILED_DESCRIPTION.to_string(),
            retryable: true,
            field_errors: Vec::new(),
        }
    }
}

/// One card in the appointment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentCardItem {
    pub appointment_id: String,
    pub title: String,
    pub type_label: String,
    pub status_label: String,
    pub schedule_label: String,
    pub vehicle_plate: Option<String>,
}

/// Listing envelope for the landing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentListResponse {
    /// Cards in booking order.
    pub items: Vec<AppointmentCardItem>,
    /// Empty-state text when `items` is empty, otherwise a count summary.
    pub message: String,
}

/// Full details for the details dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDetailsItem {
    pub appointment_id: String,
    pub type_label: String,
    pub status_label: String,
    pub date_label: String,
    pub time_label: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub party_size_label: Option<String>,
    pub vehicle_plate: Option<String>,
    pub vehicle_model: Option<String>,
}

/// Returns the initial state of a fresh booking form.
#[flutter_rust_bridge::frb(sync)]
pub fn booking_form_defaults() -> BookingFormInput {
    let defaults = AppointmentForm::with_defaults();
    BookingFormInput {
        reservation_type: defaults.reservation_type.unwrap_or_default(),
        date: defaults.date.unwrap_or_default(),
        time: defaults.time.unwrap_or_default(),
        contact_name: defaults.contact_name.unwrap_or_default(),
        email: defaults.email.unwrap_or_default(),
        phone: defaults.phone.unwrap_or_default(),
        number_of_people: defaults.number_of_people,
        vehicle_plate: defaults.vehicle_plate.unwrap_or_default(),
        vehicle_model: defaults.vehicle_model.unwrap_or_default(),
    }
}

/// Lists stored appointments for the landing view.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never fails: unreadable storage yields the empty state.
#[flutter_rust_bridge::frb(sync)]
pub fn appointments_list() -> AppointmentListResponse {
    let cards = match with_booking_service(|service| {
        service
            .list_appointments()
            .iter()
            .map(AppointmentCardView::from)
            .collect::<Vec<_>>()
    }) {
        Ok(cards) => cards,
        Err(err) => {
            warn!("event=appointments_list module=ffi status=degraded error={err}");
            Vec::new()
        }
    };

    let items = cards
        .into_iter()
        .map(to_card_item)
        .collect::<Vec<_>>();
    let message = if items.is_empty() {
        EMPTY_LIST_MESSAGE.to_string()
    } else {
        format!("{} appointment(s).", items.len())
    };
    AppointmentListResponse { items, message }
}

/// Validates and stores one booking.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - On validation failure, returns every field error and stores nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn appointment_book(form: BookingFormInput) -> BookingResponse {
    let form = AppointmentForm {
        reservation_type: Some(form.reservation_type),
        date: Some(form.date),
        time: Some(form.time),
        contact_name: Some(form.contact_name),
        email: Some(form.email),
        phone: Some(form.phone),
        number_of_people: form.number_of_people,
        vehicle_plate: Some(form.vehicle_plate),
        vehicle_model: Some(form.vehicle_model),
    };
    submit_with(|service| service.submit(&form))
}

/// Validates and stores one booking submitted as a JSON object.
///
/// Field names follow the persisted layout (`reservationType`, `contactName`,
/// ...). Malformed JSON is validated as an empty form.
#[flutter_rust_bridge::frb(sync)]
pub fn appointment_book_json(candidate_json: String) -> BookingResponse {
    let candidate = serde_json::from_str::<serde_json::Value>(&candidate_json)
        .unwrap_or(serde_json::Value::Null);
    submit_with(|service| service.submit_candidate(&candidate))
}

/// Looks up one stored appointment for the details dialog.
///
/// Returns `None` for unknown or malformed ids.
#[flutter_rust_bridge::frb(sync)]
pub fn appointment_details(appointment_id: String) -> Option<AppointmentDetailsItem> {
    let id = Uuid::parse_str(appointment_id.trim()).ok()?;
    with_booking_service(|service| {
        service
            .list_appointments()
            .iter()
            .find(|appointment| appointment.id == id)
            .map(AppointmentDetailsView::from)
    })
    .ok()
    .flatten()
    .map(to_details_item)
}

fn submit_with(
    submit: impl FnOnce(
        &BookingService<SqliteStorage<'_>>,
    ) -> Result<appointly_core::Appointment, BookingError>,
) -> BookingResponse {
    booking_response(with_booking_service(submit))
}

fn booking_response(
    outcome: Result<Result<appointly_core::Appointment, BookingError>, String>,
) -> BookingResponse {
    match outcome {
        Ok(Ok(appointment)) => BookingResponse::booked(appointment.id),
        Ok(Err(err)) => BookingResponse::rejected(&err),
        Err(err) => {
            warn!("event=appointment_book module=ffi status=error error_code=store_unavailable error={err}");
            BookingResponse::unavailable()
        }
    }
}

fn resolve_config() -> Result<AppointlyConfig, String> {
    CONFIG
        .get_or_init(|| AppointlyConfig::from_env().map_err(|err| err.to_string()))
        .clone()
}

fn with_booking_service<T>(
    f: impl FnOnce(&BookingService<SqliteStorage<'_>>) -> T,
) -> Result<T, String> {
    let config = resolve_config()?;
    let _guard = STORE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let conn = open_db(&config.db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    let mut storage = SqliteStorage::try_new(&conn)
        .map_err(|err| format!("store storage init failed: {err}"))?;
    if let Some(quota_bytes) = config.storage_quota_bytes {
        storage = storage.with_quota(quota_bytes);
    }
    let service = BookingService::new(AppointmentStore::with_key(storage, config.storage_key));
    Ok(f(&service))
}

fn to_card_item(view: AppointmentCardView) -> AppointmentCardItem {
    AppointmentCardItem {
        appointment_id: view.id,
        title: view.title,
        type_label: view.type_label,
        status_label: view.status_label,
        schedule_label: view.schedule_label,
        vehicle_plate: view.vehicle_plate,
    }
}

fn to_details_item(view: AppointmentDetailsView) -> AppointmentDetailsItem {
    AppointmentDetailsItem {
        appointment_id: view.id,
        type_label: view.type_label,
        status_label: view.status_label,
        date_label: view.date_label,
        time_label: view.time_label,
        contact_name: view.contact_name,
        email: view.email,
        phone: view.phone,
        party_size_label: view.party_size_label,
        vehicle_plate: view.vehicle_plate,
        vehicle_model: view.vehicle_model,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        appointment_book, appointment_book_json, appointment_details, appointments_list,
        booking_form_defaults, booking_response, core_version, init_logging, ping,
        BookingFormInput,
    };
    use std::sync::Once;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_DB: Once = Once::new();

    fn use_test_db() {
        TEST_DB.call_once(|| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time went backwards")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "appointly-ffi-test-{}-{nanos}.sqlite3",
                std::process::id()
            ));
            std::env::set_var("APPOINTLY_DB_PATH", path);
        });
    }

    fn valid_input(contact_name: &str) -> BookingFormInput {
        BookingFormInput {
            reservation_type: "individual".to_string(),
            date: "2025-01-10".to_string(),
            time: "14:00".to_string(),
            contact_name: contact_name.to_string(),
            email: "jo@example.com".to_string(),
            phone: "5551234567".to_string(),
            number_of_people: Some(2),
            vehicle_plate: "ABC-123".to_string(),
            vehicle_model: "Civic".to_string(),
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn form_defaults_start_as_individual_and_fail_validation() {
        use_test_db();
        let defaults = booking_form_defaults();
        assert_eq!(defaults.reservation_type, "individual");

        let response = appointment_book(defaults);
        assert!(!response.ok);
        assert!(!response.retryable);
        assert_eq!(response.field_errors.len(), 5);
        assert!(response
            .field_errors
            .iter()
            .all(|error| error.code == "missing_field"));
    }

    #[test]
    fn booked_appointment_is_listed_and_has_details() {
        use_test_db();
        let response = appointment_book(valid_input("Jo Lee"));
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.title, "Appointment Booked Successfully!");
        let appointment_id = response
            .appointment_id
            .expect("booking should return appointment_id");

        let listed = appointments_list();
        let card = listed
            .items
            .iter()
            .find(|item| item.appointment_id == appointment_id)
            .expect("booked appointment should be listed");
        assert_eq!(card.title, "Individual Booking");
        assert_eq!(card.schedule_label, "Fri, Jan 10, 02:00 PM");

        let details = appointment_details(appointment_id).expect("details should exist");
        assert_eq!(details.contact_name, "Jo Lee");
        assert_eq!(details.party_size_label.as_deref(), Some("2 people"));
        assert_eq!(details.date_label, "Friday, January 10, 2025");
    }

    #[test]
    fn json_booking_reports_field_errors_by_wire_name() {
        use_test_db();
        let response = appointment_book_json(
            r#"{"reservationType":"individual","date":"2025-01-10","time":"14:00",
                "contactName":"Jo Lee","email":"not-an-email","phone":"5551234567",
                "numberOfPeople":0}"#
                .to_string(),
        );

        assert!(!response.ok);
        let fields = response
            .field_errors
            .iter()
            .map(|error| (error.field.as_str(), error.code.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec![("email", "invalid_format"), ("numberOfPeople", "out_of_range")]
        );
    }

    #[test]
    fn store_open_failure_shows_generic_retryable_message() {
        let response = booking_response(Err(
            "store DB open failed: unable to open /private/appointly.sqlite3".to_string(),
        ));

        assert!(!response.ok);
        assert!(response.retryable);
        assert_eq!(response.title, "Error");
        assert_eq!(
            response.message,
            "Failed to book appointment. Please try again."
        );
        assert!(response.field_errors.is_empty());
    }

    #[test]
    fn unknown_or_malformed_ids_have_no_details() {
        use_test_db();
        assert!(appointment_details("not-a-uuid".to_string()).is_none());
        assert!(appointment_details(uuid::Uuid::new_v4().to_string()).is_none());
    }
}
