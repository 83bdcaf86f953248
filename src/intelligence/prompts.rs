//! Prompt construction for the text-generation collaborator.

use serde_json::{json, Value};

use crate::types::{Client, Enquiry, Project};

/// Executive summary of a client (max 3 sentences). `current` is the
/// client's most recent project, called out separately when present.
pub fn client_summary(client: &Client, projects: &[&Project], current: Option<&Project>) -> String {
    let project_lines = projects
        .iter()
        .map(|p| format!("- {} ({}, ${})", p.name, p.status, p.budget))
        .collect::<Vec<_>>()
        .join("\n");
    let current_line = current
        .map(|p| format!("Current project: {} ({}, {}% complete)\n", p.name, p.status, p.progress))
        .unwrap_or_default();

    format!(
        "You are an expert CRM assistant. Analyze the following client data and provide a \
         concise, professional executive summary (max 3 sentences).\n\
         Highlight key risks or opportunities based on the notes and project status.\n\n\
         Client: {} ({})\n\
         Status: {}\n\
         Notes: {}\n\
         {}\
         Projects:\n{}\n",
        client.name, client.company, client.status, client.notes, current_line, project_lines
    )
}

pub fn email_draft(client: &Client, context: &str, sign_off: &str) -> String {
    format!(
        "Draft a professional, short email to {} from {}.\n\
         Context: {}\n\
         Tone: Professional, helpful, concise.\n\
         Sign off: \"{}\"\n",
        client.name, client.company, context, sign_off
    )
}

pub fn next_action(client: &Client) -> String {
    format!(
        "Based on these notes: \"{}\", suggest the single most important next step for a CRM \
         manager. Start with a verb. Keep it under 10 words.",
        client.notes
    )
}

pub fn enquiry_relevance(enquiry: &Enquiry, organisation: &str) -> String {
    format!(
        "Analyze this website enquiry for \"{}\" (Corporate Training/Consulting firm).\n\
         Determine if it is a relevant sales lead or spam.\n\n\
         Enquiry Name: {}\n\
         Message: {}\n\
         Email: {}\n",
        organisation, enquiry.name, enquiry.message, enquiry.email
    )
}

/// Response schema for `enquiry_relevance`.
pub fn enquiry_relevance_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isRelevant": { "type": "BOOLEAN" },
            "reason": { "type": "STRING" }
        },
        "propertyOrdering": ["isRelevant", "reason"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devtools::{sample_client, sample_enquiry, sample_project, ts};
    use crate::types::ClientStatus;

    #[test]
    fn test_client_summary_lists_projects() {
        let mut client = sample_client("c1", ClientStatus::Lead);
        client.notes = "Needs a demo by Tuesday.".into();
        let mut project = sample_project("p1", "c1", "Security Infrastructure Audit", ts("2023-11-15T00:00:00"));
        project.budget = 45000.0;

        let prompt = client_summary(&client, &[&project], None);
        assert!(prompt.contains("Status: Lead"));
        assert!(!prompt.contains("Current project:"));
        assert!(prompt.contains("Needs a demo by Tuesday."));
        assert!(prompt.contains("- Security Infrastructure Audit (Planning, $45000)"));

        project.progress = 65;
        let prompt = client_summary(&client, &[&project], Some(&project));
        assert!(prompt.contains("Current project: Security Infrastructure Audit (Planning, 65% complete)\nProjects:"));
    }

    #[test]
    fn test_prompts_use_organisation_and_sign_off() {
        let client = sample_client("c1", ClientStatus::Active);
        assert!(email_draft(&client, "Renewal", "Cheers, Acme").contains("Sign off: \"Cheers, Acme\""));

        let enquiry = sample_enquiry("e1", "Tony Stark");
        let prompt = enquiry_relevance(&enquiry, "Acme Consulting");
        assert!(prompt.contains("\"Acme Consulting\""));
        assert!(prompt.contains("Enquiry Name: Tony Stark"));
    }
}
