//! Read-side projections over a `Snapshot`.
//!
//! Nothing here mutates state or reads the clock; "now" is always a parameter.

pub mod clients;
pub mod dashboard;
pub mod enquiries;
pub mod follow_ups;
pub mod projects;
