// Clients service
// Lead and client lifecycle: manual add, onboarding (conversion), dismissal,
// restoration, revert-to-lead, edits and deletion.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::enquiries::company_from_website;
use super::projects::ProjectDetails;
use super::{new_id, non_blank, position, replace_one, required};
use crate::error::{CrmError, CrmResult};
use crate::types::{Client, ClientStatus, ClientType, LeadType, Project};

/// Manually entered client or lead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub status: ClientStatus,
    #[serde(default)]
    pub lead_type: Option<LeadType>,
    #[serde(default = "default_client_type")]
    pub client_type: ClientType,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub onboarding_date: Option<NaiveDate>,
    #[serde(default)]
    pub project: Option<ProjectDetails>,
}

fn default_client_type() -> ClientType {
    ClientType::New
}

impl NewClient {
    pub fn new(name: impl Into<String>, status: ClientStatus) -> Self {
        Self {
            name: name.into(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            status,
            lead_type: None,
            client_type: ClientType::New,
            industry: None,
            notes: String::new(),
            website: None,
            onboarding_date: None,
            project: None,
        }
    }
}

/// Parameters of the onboarding (conversion) transition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    /// Target status: `Active` or `Inactive`.
    pub status: ClientStatus,
    pub onboarding_date: NaiveDate,
    pub project: ProjectDetails,
}

/// Contact-field edits. `None` leaves a field unchanged. Status and
/// conversion flags are only changed by lifecycle commands.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEdits {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub website: Option<String>,
    pub lead_type: Option<LeadType>,
}

/// Add a client or lead by hand.
///
/// Notes are tagged with the client type and the project name, if any. A
/// supplied project becomes a `Project` record.
pub fn add_client(
    clients: &[Client],
    projects: &[Project],
    req: NewClient,
    now: NaiveDateTime,
) -> CrmResult<(Vec<Client>, Vec<Project>)> {
    let name = required("name", &req.name)?;
    if req.status == ClientStatus::Dismissed {
        return Err(CrmError::validation(
            "status",
            "a new client cannot start out dismissed",
        ));
    }
    let lead_type = match (req.status, req.lead_type) {
        (ClientStatus::Lead, None) => {
            return Err(CrmError::validation("leadType", "a lead needs a Hot, Warm or Cold tier"))
        }
        (ClientStatus::Lead, tier) => tier,
        _ => None,
    };

    let today = now.date();
    let id = new_id("c");
    let website = non_blank(req.website);

    let project = req
        .project
        .map(|details| details.into_project(&id, now))
        .transpose()?;

    let mut notes = String::from(req.client_type.notes_tag());
    if let Some(ref project) = project {
        notes.push_str(&format!("[Project: {}]: ", project.name));
    }
    notes.push_str(req.notes.trim());

    let client = Client {
        id,
        name,
        company: non_blank(Some(req.company))
            .unwrap_or_else(|| company_from_website(website.as_deref())),
        email: req.email.trim().to_string(),
        phone: req.phone.trim().to_string(),
        status: req.status,
        lead_type,
        is_converted: false,
        industry: non_blank(req.industry).unwrap_or_else(|| "Unknown".to_string()),
        notes,
        website,
        joined_date: req.onboarding_date.unwrap_or(today),
        last_contact: today,
    };
    log::info!("Added {} client {}", client.status, client.id);

    let mut next_clients = Vec::with_capacity(clients.len() + 1);
    next_clients.push(client);
    next_clients.extend_from_slice(clients);

    let mut next_projects = projects.to_vec();
    next_projects.extend(project);

    Ok((next_clients, next_projects))
}

/// Add a lead by hand. Status is forced to `Lead`.
pub fn add_lead(
    clients: &[Client],
    projects: &[Project],
    mut req: NewClient,
    lead_type: LeadType,
    now: NaiveDateTime,
) -> CrmResult<(Vec<Client>, Vec<Project>)> {
    req.status = ClientStatus::Lead;
    req.lead_type = Some(lead_type);
    add_client(clients, projects, req, now)
}

/// Onboard a lead: `Lead -> Active|Inactive` with `is_converted = true`.
///
/// The onboarding block is appended to the existing notes; earlier text is
/// never rewritten. The project details become a `Project` record.
pub fn onboard(
    clients: &[Client],
    projects: &[Project],
    id: &str,
    req: OnboardRequest,
    now: NaiveDateTime,
) -> CrmResult<(Vec<Client>, Vec<Project>)> {
    let idx = position(clients, id)?;
    let current = &clients[idx];
    if current.status != ClientStatus::Lead {
        return Err(CrmError::invalid_transition("client", id, current.status, "onboard"));
    }
    if !matches!(req.status, ClientStatus::Active | ClientStatus::Inactive) {
        return Err(CrmError::validation(
            "status",
            format!("onboarding target must be Active or Inactive, got {}", req.status),
        ));
    }

    let block = onboarding_block(&req.project);
    let project = req.project.into_project(id, now)?;

    let mut next_clients = clients.to_vec();
    let client = &mut next_clients[idx];
    client.status = req.status;
    client.is_converted = true;
    client.joined_date = req.onboarding_date;
    client.notes = format!("{}\n\n{}", client.notes, block);

    log::info!(
        "Onboarded lead {} as {} with project {}",
        id,
        req.status,
        project.id
    );

    let mut next_projects = projects.to_vec();
    next_projects.push(project);
    Ok((next_clients, next_projects))
}

fn onboarding_block(project: &ProjectDetails) -> String {
    format!(
        "[Project Onboarding]\nProject: {}\nStatus: {}\nDescription: {}\nDeadline: {}\nScope: {}",
        project.name.trim(),
        project.status,
        project.description.trim(),
        project
            .deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        project.scope_document.as_deref().unwrap_or_default().trim(),
    )
}

/// `Lead | converted -> Dismissed`. Reversible through `restore_lead`.
pub fn dismiss_lead(clients: &[Client], id: &str) -> CrmResult<Vec<Client>> {
    let next = replace_one(clients, id, |c| {
        let eligible = c.status == ClientStatus::Lead || c.is_converted;
        if !eligible || c.status == ClientStatus::Dismissed {
            return Err(CrmError::invalid_transition("client", id, c.status, "dismiss"));
        }
        c.status = ClientStatus::Dismissed;
        Ok(())
    })?;
    log::info!("Dismissed lead {}", id);
    Ok(next)
}

/// `Dismissed -> Lead`, discarding any earlier conversion.
pub fn restore_lead(clients: &[Client], id: &str) -> CrmResult<Vec<Client>> {
    let next = replace_one(clients, id, |c| {
        if c.status != ClientStatus::Dismissed {
            return Err(CrmError::invalid_transition("client", id, c.status, "restore"));
        }
        reset_to_lead(c);
        Ok(())
    })?;
    log::info!("Restored lead {}", id);
    Ok(next)
}

/// Converted, not dismissed -> `Lead`. Same end state as `restore_lead`.
pub fn revert_to_lead(clients: &[Client], id: &str) -> CrmResult<Vec<Client>> {
    let next = replace_one(clients, id, |c| {
        if !c.is_converted || c.status == ClientStatus::Dismissed {
            let from = if c.is_converted {
                c.status.to_string()
            } else {
                format!("{} (not converted)", c.status)
            };
            return Err(CrmError::invalid_transition("client", id, from, "revert to lead"));
        }
        reset_to_lead(c);
        Ok(())
    })?;
    log::info!("Reverted client {} to lead", id);
    Ok(next)
}

fn reset_to_lead(client: &mut Client) {
    client.status = ClientStatus::Lead;
    client.is_converted = false;
}

/// Edit contact fields.
pub fn update_details(clients: &[Client], id: &str, edits: ClientEdits) -> CrmResult<Vec<Client>> {
    let name = edits.name.as_deref().map(|n| required("name", n)).transpose()?;

    replace_one(clients, id, |c| {
        if let Some(name) = name {
            c.name = name;
        }
        if let Some(company) = non_blank(edits.company) {
            c.company = company;
        }
        if let Some(email) = edits.email {
            c.email = email.trim().to_string();
        }
        if let Some(phone) = edits.phone {
            c.phone = phone.trim().to_string();
        }
        if let Some(industry) = non_blank(edits.industry) {
            c.industry = industry;
        }
        if let Some(notes) = edits.notes {
            c.notes = notes;
        }
        if edits.website.is_some() {
            c.website = non_blank(edits.website);
        }
        if let Some(tier) = edits.lead_type {
            if c.status != ClientStatus::Lead && !c.is_converted {
                return Err(CrmError::invalid_transition("client", id, c.status, "set lead tier on"));
            }
            c.lead_type = Some(tier);
        }
        Ok(())
    })
}

/// Hard delete. Pending leads must be dismissed first; any other client can
/// be deleted directly. Follow-ups, activities and projects referencing the
/// client are kept.
pub fn delete_client(clients: &[Client], id: &str) -> CrmResult<Vec<Client>> {
    let idx = position(clients, id)?;
    if clients[idx].status == ClientStatus::Lead {
        return Err(CrmError::invalid_transition("client", id, ClientStatus::Lead, "delete"));
    }
    let mut next = clients.to_vec();
    next.remove(idx);
    log::info!("Deleted client {}", id);
    Ok(next)
}
