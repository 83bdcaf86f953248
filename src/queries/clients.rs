//! Client and lead list projections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Client, ClientStatus, LeadType, ParseEnumError, Project};

/// Display name for records whose client has been deleted.
pub const UNKNOWN_CLIENT: &str = "Unknown client";

/// Sub-tabs of the Leads list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeadView {
    /// Leads not yet onboarded.
    #[default]
    Pending,
    /// Onboarded leads that are not dismissed, whatever their current status.
    Converted,
    Dismissed,
}

impl LeadView {
    pub fn admits(&self, client: &Client) -> bool {
        match self {
            LeadView::Pending => client.is_pending_lead(),
            LeadView::Converted => {
                client.is_converted && client.status != ClientStatus::Dismissed
            }
            LeadView::Dismissed => client.status == ClientStatus::Dismissed,
        }
    }
}

impl FromStr for LeadView {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LeadView::Pending),
            "converted" => Ok(LeadView::Converted),
            "dismissed" => Ok(LeadView::Dismissed),
            _ => Err(ParseEnumError {
                kind: "lead view",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LeadView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadView::Pending => write!(f, "Pending"),
            LeadView::Converted => write!(f, "Converted"),
            LeadView::Dismissed => write!(f, "Dismissed"),
        }
    }
}

/// List filters. Empty search and `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub search: String,
    pub status: Option<ClientStatus>,
    pub lead_type: Option<LeadType>,
}

impl ClientFilter {
    pub fn admits(&self, client: &Client) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || client.name.to_lowercase().contains(&needle)
            || client.company.to_lowercase().contains(&needle);

        let matches_status = self.status.map_or(true, |s| client.status == s);
        let matches_tier = self.lead_type.map_or(true, |t| client.lead_type == Some(t));

        matches_search && matches_status && matches_tier
    }
}

/// Leads list: the lead sub-view combined with the list filters.
pub fn leads<'a>(clients: &'a [Client], view: LeadView, filter: &ClientFilter) -> Vec<&'a Client> {
    clients
        .iter()
        .filter(|c| view.admits(c) && filter.admits(c))
        .collect()
}

/// Clients list: `Active` clients only.
pub fn active_clients<'a>(clients: &'a [Client], filter: &ClientFilter) -> Vec<&'a Client> {
    clients
        .iter()
        .filter(|c| c.status == ClientStatus::Active && filter.admits(c))
        .collect()
}

/// Name for a client id, or the unknown-client placeholder.
pub fn client_name<'a>(clients: &'a [Client], client_id: &str) -> &'a str {
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.name.as_str())
        .unwrap_or(UNKNOWN_CLIENT)
}

/// Most recently created project for a client. On equal timestamps the one
/// added last wins.
pub fn current_project<'a>(projects: &'a [Project], client_id: &str) -> Option<&'a Project> {
    projects
        .iter()
        .filter(|p| p.client_id == client_id)
        .max_by_key(|p| p.created_at)
}
