// Enquiries service
// Inbox lifecycle: new/read -> hold -> dismissed -> restored, and promotion
// of an enquiry into a Lead client.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::{new_id, non_blank, position, replace_one, required};
use crate::error::{CrmError, CrmResult};
use crate::types::{AiAnalysis, Client, ClientStatus, Enquiry, EnquiryStatus, LeadType};

/// Company placeholder for leads without a website.
pub const INDEPENDENT_COMPANY: &str = "Independent";

/// A simulated website submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnquiry {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: Option<String>,
    pub message: String,
}

/// Contact-field edits. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryEdits {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub message: Option<String>,
}

/// Parameters for promoting an enquiry to a lead. Contact overrides that are
/// `None` (or blank) fall back to the enquiry's own values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub lead_type: LeadType,
    /// Industry/category of the new lead. Defaults to "Unknown".
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Replaces the enquiry message as the lead's notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl PromoteRequest {
    pub fn new(lead_type: LeadType) -> Self {
        Self {
            lead_type,
            category: None,
            name: None,
            email: None,
            phone: None,
            website: None,
            notes: None,
        }
    }
}

/// Prepend a new enquiry with status `new`.
pub fn add_enquiry(
    enquiries: &[Enquiry],
    req: NewEnquiry,
    now: NaiveDateTime,
) -> CrmResult<Vec<Enquiry>> {
    let enquiry = Enquiry {
        id: new_id("e"),
        name: required("name", &req.name)?,
        email: req.email.trim().to_string(),
        phone: req.phone.trim().to_string(),
        website: non_blank(req.website),
        message: required("message", &req.message)?,
        created_at: now,
        status: EnquiryStatus::New,
        hold_reason: None,
        ai_analysis: None,
    };
    log::info!("Received enquiry {} from {}", enquiry.id, enquiry.name);

    let mut next = Vec::with_capacity(enquiries.len() + 1);
    next.push(enquiry);
    next.extend_from_slice(enquiries);
    Ok(next)
}

/// `new -> read`. Marking an already-read enquiry is a no-op.
pub fn mark_read(enquiries: &[Enquiry], id: &str) -> CrmResult<Vec<Enquiry>> {
    replace_one(enquiries, id, |e| match e.status {
        EnquiryStatus::New | EnquiryStatus::Read => {
            e.status = EnquiryStatus::Read;
            Ok(())
        }
        other => Err(CrmError::invalid_transition("enquiry", id, other, "mark read")),
    })
}

/// `new|read -> hold`. A non-empty reason is required.
pub fn hold(enquiries: &[Enquiry], id: &str, reason: &str) -> CrmResult<Vec<Enquiry>> {
    let idx = position(enquiries, id)?;
    let status = enquiries[idx].status;
    if !status.is_inbox() {
        return Err(CrmError::invalid_transition("enquiry", id, status, "hold"));
    }
    let reason = required("holdReason", reason)?;

    let next = replace_one(enquiries, id, |e| {
        e.status = EnquiryStatus::Hold;
        e.hold_reason = Some(reason);
        Ok(())
    })?;
    log::info!("Enquiry {} put on hold", id);
    Ok(next)
}

/// `new|read|hold -> dismissed`. Soft delete; see `restore`.
pub fn dismiss(enquiries: &[Enquiry], id: &str) -> CrmResult<Vec<Enquiry>> {
    let next = replace_one(enquiries, id, |e| match e.status {
        EnquiryStatus::Dismissed => Err(CrmError::invalid_transition(
            "enquiry",
            id,
            e.status,
            "dismiss",
        )),
        _ => {
            e.status = EnquiryStatus::Dismissed;
            Ok(())
        }
    })?;
    log::info!("Enquiry {} dismissed", id);
    Ok(next)
}

/// `hold|dismissed -> new`. The hold reason is cleared only when restoring
/// from hold.
pub fn restore(enquiries: &[Enquiry], id: &str) -> CrmResult<Vec<Enquiry>> {
    let next = replace_one(enquiries, id, |e| match e.status {
        EnquiryStatus::Hold => {
            e.status = EnquiryStatus::New;
            e.hold_reason = None;
            Ok(())
        }
        EnquiryStatus::Dismissed => {
            e.status = EnquiryStatus::New;
            Ok(())
        }
        other => Err(CrmError::invalid_transition("enquiry", id, other, "restore")),
    })?;
    log::info!("Enquiry {} restored to inbox", id);
    Ok(next)
}

/// Promote an inbox enquiry to a Lead.
///
/// The enquiry leaves the enquiry collection and exactly one client with
/// `status = Lead` is prepended to the client collection. The message becomes
/// the lead's notes.
pub fn promote(
    enquiries: &[Enquiry],
    clients: &[Client],
    id: &str,
    req: PromoteRequest,
    today: NaiveDate,
) -> CrmResult<(Vec<Enquiry>, Vec<Client>)> {
    let idx = position(enquiries, id)?;
    let enquiry = &enquiries[idx];
    if !enquiry.status.is_inbox() {
        return Err(CrmError::invalid_transition(
            "enquiry",
            id,
            enquiry.status,
            "promote",
        ));
    }

    let website = non_blank(req.website).or_else(|| non_blank(enquiry.website.clone()));
    let lead = Client {
        id: new_id("c"),
        name: non_blank(req.name).unwrap_or_else(|| enquiry.name.clone()),
        company: company_from_website(website.as_deref()),
        email: non_blank(req.email).unwrap_or_else(|| enquiry.email.clone()),
        phone: non_blank(req.phone).unwrap_or_else(|| enquiry.phone.clone()),
        status: ClientStatus::Lead,
        lead_type: Some(req.lead_type),
        is_converted: false,
        industry: non_blank(req.category).unwrap_or_else(|| "Unknown".to_string()),
        notes: non_blank(req.notes).unwrap_or_else(|| enquiry.message.clone()),
        website,
        joined_date: today,
        last_contact: today,
    };
    log::info!(
        "Promoted enquiry {} to {} lead {}",
        id,
        req.lead_type,
        lead.id
    );

    let mut next_enquiries = enquiries.to_vec();
    next_enquiries.remove(idx);

    let mut next_clients = Vec::with_capacity(clients.len() + 1);
    next_clients.push(lead);
    next_clients.extend_from_slice(clients);

    Ok((next_enquiries, next_clients))
}

/// Hard delete, any status.
pub fn delete(enquiries: &[Enquiry], id: &str) -> CrmResult<Vec<Enquiry>> {
    let idx = position(enquiries, id)?;
    let mut next = enquiries.to_vec();
    next.remove(idx);
    log::info!("Deleted enquiry {}", id);
    Ok(next)
}

/// Hard delete every dismissed enquiry.
pub fn purge_dismissed(enquiries: &[Enquiry]) -> Vec<Enquiry> {
    let next: Vec<Enquiry> = enquiries
        .iter()
        .filter(|e| e.status != EnquiryStatus::Dismissed)
        .cloned()
        .collect();
    log::info!(
        "Purged {} dismissed enquiries",
        enquiries.len() - next.len()
    );
    next
}

/// Attach an AI relevance result.
pub fn record_analysis(
    enquiries: &[Enquiry],
    id: &str,
    analysis: AiAnalysis,
) -> CrmResult<Vec<Enquiry>> {
    replace_one(enquiries, id, |e| {
        e.ai_analysis = Some(analysis);
        Ok(())
    })
}

/// Edit contact fields without touching status.
pub fn update(enquiries: &[Enquiry], id: &str, edits: EnquiryEdits) -> CrmResult<Vec<Enquiry>> {
    let name = edits.name.as_deref().map(|n| required("name", n)).transpose()?;
    let message = edits
        .message
        .as_deref()
        .map(|m| required("message", m))
        .transpose()?;

    replace_one(enquiries, id, |e| {
        if let Some(name) = name {
            e.name = name;
        }
        if let Some(message) = message {
            e.message = message;
        }
        if let Some(email) = edits.email {
            e.email = email.trim().to_string();
        }
        if let Some(phone) = edits.phone {
            e.phone = phone.trim().to_string();
        }
        if edits.website.is_some() {
            e.website = non_blank(edits.website);
        }
        Ok(())
    })
}

/// Company name derived from a website: its host, or "Independent".
///
/// Accepts URLs with or without a scheme (`https://acme.io/about`,
/// `acme.io/about`).
pub fn company_from_website(website: Option<&str>) -> String {
    let Some(raw) = website.map(str::trim).filter(|w| !w.is_empty()) else {
        return INDEPENDENT_COMPANY.to_string();
    };

    let parsed = url::Url::parse(raw)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| url::Url::parse(&format!("https://{raw}")).ok());

    parsed
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| {
            raw.trim_start_matches("https://")
                .trim_start_matches("http://")
                .split('/')
                .next()
                .unwrap_or(raw)
                .to_string()
        })
}
