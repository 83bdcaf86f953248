//! Leadbook: a single-user CRM core.
//!
//! Enquiries arrive in an inbox, get promoted to leads, leads are onboarded
//! into active clients, and follow-ups, activities and projects hang off
//! clients. All mutations go through `state::Store`, which persists the whole
//! snapshot before publishing it.

pub mod db;
pub mod devtools;
pub mod error;
pub mod intelligence;
mod migrations;
pub mod queries;
pub mod services;
pub mod state;
pub mod types;
