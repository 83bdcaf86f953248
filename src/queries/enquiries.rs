//! Enquiry inbox projections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Enquiry, EnquiryStatus, ParseEnumError};

/// Tabs of the enquiry inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InboxTab {
    /// `new` and `read` enquiries.
    #[default]
    Inbox,
    Hold,
    Dismissed,
}

impl InboxTab {
    pub fn admits(&self, enquiry: &Enquiry) -> bool {
        match self {
            InboxTab::Inbox => enquiry.status.is_inbox(),
            InboxTab::Hold => enquiry.status == EnquiryStatus::Hold,
            InboxTab::Dismissed => enquiry.status == EnquiryStatus::Dismissed,
        }
    }
}

impl FromStr for InboxTab {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(InboxTab::Inbox),
            "hold" | "on-hold" => Ok(InboxTab::Hold),
            "dismissed" => Ok(InboxTab::Dismissed),
            _ => Err(ParseEnumError {
                kind: "inbox tab",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InboxTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboxTab::Inbox => write!(f, "Inbox"),
            InboxTab::Hold => write!(f, "On Hold"),
            InboxTab::Dismissed => write!(f, "Dismissed"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnquiryFilter {
    /// Case-insensitive match over name, email and message.
    pub search: String,
    /// Hide enquiries the relevance check marked as not relevant.
    pub hide_irrelevant: bool,
}

impl EnquiryFilter {
    pub fn admits(&self, enquiry: &Enquiry) -> bool {
        if self.hide_irrelevant
            && enquiry
                .ai_analysis
                .as_ref()
                .is_some_and(|a| !a.is_relevant)
        {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || enquiry.name.to_lowercase().contains(&needle)
            || enquiry.email.to_lowercase().contains(&needle)
            || enquiry.message.to_lowercase().contains(&needle)
    }
}

/// Enquiries on `tab` passing `filter`, newest first.
pub fn list<'a>(enquiries: &'a [Enquiry], tab: InboxTab, filter: &EnquiryFilter) -> Vec<&'a Enquiry> {
    let mut out: Vec<&Enquiry> = enquiries
        .iter()
        .filter(|e| tab.admits(e) && filter.admits(e))
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Inbox enquiries with no relevance result yet.
pub fn needing_analysis(enquiries: &[Enquiry]) -> Vec<&Enquiry> {
    enquiries
        .iter()
        .filter(|e| e.status.is_inbox() && e.ai_analysis.is_none())
        .collect()
}

/// Badge count for the inbox tab.
pub fn inbox_count(enquiries: &[Enquiry]) -> usize {
    enquiries.iter().filter(|e| e.status.is_inbox()).count()
}

/// Enquiries nobody has opened yet.
pub fn unread_count(enquiries: &[Enquiry]) -> usize {
    enquiries
        .iter()
        .filter(|e| e.status == EnquiryStatus::New)
        .count()
}
