//! Display projections of booking records.
//!
//! Views carry preformatted labels so presentation layers stay free of
//! date/time parsing rules.

pub mod appointment_view;
