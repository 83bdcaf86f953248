//! Follow-up classification relative to "now".
//!
//! All functions take the current moment as a parameter and never read the
//! system clock. Comparisons use calendar days only: the time of day on a due
//! date never moves it between buckets.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::clients::UNKNOWN_CLIENT;
use crate::types::{Client, ClientStatus, DueDate, FollowUp, ParseEnumError, Priority};

/// Where a pending follow-up falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpBucket {
    Overdue,
    Today,
    Upcoming,
}

/// Due date falls on a calendar day strictly before today.
pub fn is_overdue(due: &DueDate, now: NaiveDateTime) -> bool {
    due.date() < now.date()
}

/// Due date falls on today's calendar day.
pub fn is_today(due: &DueDate, now: NaiveDateTime) -> bool {
    due.date() == now.date()
}

/// Bucket of a pending follow-up. Completed follow-ups belong to no bucket.
pub fn classify(follow_up: &FollowUp, now: NaiveDateTime) -> Option<FollowUpBucket> {
    if !follow_up.is_pending() {
        return None;
    }
    let bucket = if is_overdue(&follow_up.due_date, now) {
        FollowUpBucket::Overdue
    } else if is_today(&follow_up.due_date, now) {
        FollowUpBucket::Today
    } else {
        FollowUpBucket::Upcoming
    };
    Some(bucket)
}

/// List tabs. `All` is the only view that shows completed follow-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FollowUpView {
    #[default]
    All,
    Overdue,
    Today,
    Upcoming,
}

impl FollowUpView {
    fn admits(&self, follow_up: &FollowUp, now: NaiveDateTime) -> bool {
        let bucket = classify(follow_up, now);
        match self {
            FollowUpView::All => true,
            FollowUpView::Overdue => bucket == Some(FollowUpBucket::Overdue),
            FollowUpView::Today => bucket == Some(FollowUpBucket::Today),
            FollowUpView::Upcoming => bucket == Some(FollowUpBucket::Upcoming),
        }
    }
}

impl FromStr for FollowUpView {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FollowUpView::All),
            "overdue" | "missed" => Ok(FollowUpView::Overdue),
            "today" => Ok(FollowUpView::Today),
            "upcoming" => Ok(FollowUpView::Upcoming),
            _ => Err(ParseEnumError {
                kind: "follow-up view",
                value: s.to_string(),
            }),
        }
    }
}

/// Restrict follow-ups by the status of the linked client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientScope {
    #[default]
    All,
    Active,
    Lead,
}

impl ClientScope {
    fn admits(&self, client: Option<&Client>) -> bool {
        match self {
            ClientScope::All => true,
            ClientScope::Active => client.is_some_and(|c| c.status == ClientStatus::Active),
            ClientScope::Lead => client.is_some_and(|c| c.status == ClientStatus::Lead),
        }
    }
}

impl FromStr for ClientScope {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ClientScope::All),
            "active" | "clients" => Ok(ClientScope::Active),
            "lead" | "leads" => Ok(ClientScope::Lead),
            _ => Err(ParseEnumError {
                kind: "client scope",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FollowUpBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowUpBucket::Overdue => write!(f, "overdue"),
            FollowUpBucket::Today => write!(f, "today"),
            FollowUpBucket::Upcoming => write!(f, "upcoming"),
        }
    }
}

fn index_clients(clients: &[Client]) -> HashMap<&str, &Client> {
    clients.iter().map(|c| (c.id.as_str(), c)).collect()
}

/// Sort ascending by due date. Stable: equal due dates keep input order.
pub fn sort_by_due_date(follow_ups: &mut [&FollowUp]) {
    follow_ups.sort_by_key(|f| f.due_date.datetime());
}

/// Follow-ups visible in `view` for `scope`, sorted by due date.
///
/// A scope other than `All` drops follow-ups whose client no longer exists.
pub fn filter_follow_ups<'a>(
    follow_ups: &'a [FollowUp],
    clients: &[Client],
    view: FollowUpView,
    scope: ClientScope,
    now: NaiveDateTime,
) -> Vec<&'a FollowUp> {
    let by_id = index_clients(clients);
    let mut out: Vec<&FollowUp> = follow_ups
        .iter()
        .filter(|f| scope.admits(by_id.get(f.client_id.as_str()).copied()))
        .filter(|f| view.admits(f, now))
        .collect();
    sort_by_due_date(&mut out);
    out
}

/// Pending follow-ups whose linked client satisfies `predicate`.
///
/// Follow-ups pointing at a missing client are never counted.
pub fn count_pending_by<P>(follow_ups: &[FollowUp], clients: &[Client], predicate: P) -> usize
where
    P: Fn(&Client) -> bool,
{
    let by_id = index_clients(clients);
    follow_ups
        .iter()
        .filter(|f| f.is_pending())
        .filter_map(|f| by_id.get(f.client_id.as_str()).copied())
        .filter(|c| predicate(c))
        .count()
}

/// Per-bucket totals for badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub overdue: usize,
    pub today: usize,
    pub upcoming: usize,
    pub completed: usize,
}

impl BucketCounts {
    pub fn pending(&self) -> usize {
        self.overdue + self.today + self.upcoming
    }
}

pub fn bucket_counts(follow_ups: &[FollowUp], now: NaiveDateTime) -> BucketCounts {
    let mut counts = BucketCounts::default();
    for follow_up in follow_ups {
        match classify(follow_up, now) {
            Some(FollowUpBucket::Overdue) => counts.overdue += 1,
            Some(FollowUpBucket::Today) => counts.today += 1,
            Some(FollowUpBucket::Upcoming) => counts.upcoming += 1,
            None => counts.completed += 1,
        }
    }
    counts
}

/// Follow-ups whose client has been deleted.
pub fn orphaned<'a>(follow_ups: &'a [FollowUp], clients: &[Client]) -> Vec<&'a FollowUp> {
    let by_id = index_clients(clients);
    follow_ups
        .iter()
        .filter(|f| !by_id.contains_key(f.client_id.as_str()))
        .collect()
}

/// A follow-up joined with its client for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpRow {
    pub id: String,
    pub title: String,
    pub due_date: DueDate,
    pub priority: Priority,
    pub bucket: Option<FollowUpBucket>,
    pub client_id: String,
    pub client_name: String,
    pub company: String,
}

/// Join follow-ups with their clients. Missing clients render as
/// "Unknown client".
pub fn rows(follow_ups: &[&FollowUp], clients: &[Client], now: NaiveDateTime) -> Vec<FollowUpRow> {
    let by_id = index_clients(clients);
    follow_ups
        .iter()
        .map(|f| {
            let client = by_id.get(f.client_id.as_str());
            FollowUpRow {
                id: f.id.clone(),
                title: f.title.clone(),
                due_date: f.due_date,
                priority: f.priority,
                bucket: classify(f, now),
                client_id: f.client_id.clone(),
                client_name: client
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
                company: client.map(|c| c.company.clone()).unwrap_or_default(),
            }
        })
        .collect()
}
