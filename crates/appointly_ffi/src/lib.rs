//! Flutter-facing bindings for the Appointly core.
//!
//! Only use-case level functions are exported; storage and validation stay in
//! `appointly_core`.

pub mod api;
