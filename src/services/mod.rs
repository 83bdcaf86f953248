//! Pipeline commands (the lifecycle rules).
//!
//! Every command is a pure function: it takes the current collection(s) by
//! reference plus the command parameters and returns replacement collections.
//! Inputs are never mutated, so a failed command leaves the caller's state
//! exactly as it was. `state::Store` relies on this for rollback.

pub mod activities;
pub mod clients;
pub mod enquiries;
pub mod follow_ups;
pub mod projects;

use uuid::Uuid;

use crate::error::{CrmError, CrmResult};
use crate::types::{Activity, Client, Enquiry, FollowUp, Project};

/// Records addressable by id.
pub trait Identified {
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

impl Identified for Enquiry {
    const ENTITY: &'static str = "enquiry";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Client {
    const ENTITY: &'static str = "client";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for FollowUp {
    const ENTITY: &'static str = "follow-up";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Activity {
    const ENTITY: &'static str = "activity";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Project {
    const ENTITY: &'static str = "project";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Index of the record with `id`, or `NotFound`.
pub(crate) fn position<T: Identified>(items: &[T], id: &str) -> CrmResult<usize> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| CrmError::not_found(T::ENTITY, id))
}

/// Copy `items`, apply `f` to the record with `id`, and return the copy.
pub(crate) fn replace_one<T, F>(items: &[T], id: &str, f: F) -> CrmResult<Vec<T>>
where
    T: Identified + Clone,
    F: FnOnce(&mut T) -> CrmResult<()>,
{
    let idx = position(items, id)?;
    let mut next = items.to_vec();
    f(&mut next[idx])?;
    Ok(next)
}

/// Trimmed, non-empty value of a required text field.
pub(crate) fn required(field: &'static str, value: &str) -> CrmResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CrmError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Optional text with blank values collapsed to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fresh record id, e.g. `c-3f2b…`.
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
