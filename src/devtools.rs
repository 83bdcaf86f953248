//! Demo data and test fixtures.
//!
//! `seed_snapshot` builds the demo pipeline: four clients (three leads of
//! each tier plus one active account), three follow-ups placed yesterday,
//! today and in two days relative to `now`, one project, two activities and
//! one unread enquiry.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::state::Snapshot;
use crate::types::{
    Activity, Client, ClientStatus, DueDate, Enquiry, EnquiryStatus, FollowUp, FollowUpStatus,
    InteractionType, LeadType, Priority, Project, ProjectStatus,
};

fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap_or_default()
}

fn at(date: NaiveDate, hour: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, min, 0).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn client(
    id: &str,
    name: &str,
    company: &str,
    email: &str,
    phone: &str,
    status: ClientStatus,
    lead_type: Option<LeadType>,
    industry: &str,
    notes: &str,
    joined: NaiveDate,
    last_contact: NaiveDate,
) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        company: company.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        status,
        lead_type,
        is_converted: false,
        industry: industry.to_string(),
        notes: notes.to_string(),
        website: None,
        joined_date: joined,
        last_contact,
    }
}

fn follow_up(id: &str, client_id: &str, title: &str, due: NaiveDateTime, priority: Priority) -> FollowUp {
    FollowUp {
        id: id.to_string(),
        client_id: client_id.to_string(),
        title: title.to_string(),
        description: None,
        due_date: DueDate::at(due),
        status: FollowUpStatus::Pending,
        priority,
    }
}

/// Demo pipeline anchored on `now`.
pub fn seed_snapshot(now: NaiveDateTime) -> Snapshot {
    let clients = vec![
        client(
            "c1",
            "Anand Kumar",
            "FinTech Solutions Pvt Ltd",
            "anand.kumar@fintech.in",
            "+91 98765 43210",
            ClientStatus::Lead,
            Some(LeadType::Hot),
            "Financial Services",
            "Very interested in our API integration. Needs a demo by next Tuesday. Decision maker.",
            day(2023, 11, 15),
            day(2023, 11, 20),
        ),
        client(
            "c2",
            "Vikram Malhotra",
            "Malhotra Logistics",
            "vikram@malhotra.com",
            "+91 98123 45678",
            ClientStatus::Lead,
            Some(LeadType::Warm),
            "Logistics",
            "Checking budget for the next quarter. Currently using a manual system. Open to a pilot program.",
            day(2023, 11, 10),
            day(2023, 11, 18),
        ),
        client(
            "c3",
            "Kavita Rao",
            "Urban Health Care",
            "kavita.rao@urbanhealth.org",
            "+91 99887 76655",
            ClientStatus::Lead,
            Some(LeadType::Cold),
            "Healthcare",
            "Early stage discussion. Need to follow up in 3 months once their new facility is ready.",
            day(2023, 10, 5),
            day(2023, 11, 10),
        ),
        client(
            "c4",
            "Suresh Raina",
            "Nexus Real Estate",
            "suresh@nexus.co.in",
            "+91 97654 32109",
            ClientStatus::Active,
            None,
            "Real Estate",
            "Long-term client. Satisfied with the current CRM flow. Looking to upgrade to the enterprise plan.",
            day(2023, 1, 10),
            day(2023, 11, 15),
        ),
    ];

    let follow_ups = vec![
        follow_up(
            "f1",
            "c2",
            "Call regarding logistics MVP",
            now,
            Priority::High,
        ),
        follow_up(
            "f2",
            "c1",
            "Send security audit report",
            now - Duration::days(1),
            Priority::Medium,
        ),
        follow_up(
            "f3",
            "c3",
            "Follow up on dashboard latency ticket",
            now + Duration::days(2),
            Priority::Low,
        ),
    ];

    let projects = vec![Project {
        id: "p1".into(),
        client_id: "c1".into(),
        name: "Security Infrastructure Audit".into(),
        status: ProjectStatus::InProgress,
        category: "Security".into(),
        priority: Priority::High,
        description: String::new(),
        scope_document: None,
        budget: 45000.0,
        deadline: Some(day(2023, 12, 15)),
        progress: 65,
        created_at: at(day(2023, 11, 15), 0, 0),
    }];

    let activities = vec![
        Activity {
            id: "a1".into(),
            client_id: "c1".into(),
            kind: InteractionType::Email,
            description: "Sent weekly security report".into(),
            timestamp: at(day(2023, 10, 25), 14, 30),
        },
        Activity {
            id: "a2".into(),
            client_id: "c2".into(),
            kind: InteractionType::Call,
            description: "Introductory call".into(),
            timestamp: at(day(2023, 10, 28), 10, 0),
        },
    ];

    let enquiries = vec![Enquiry {
        id: "e1".into(),
        name: "Tony Stark".into(),
        email: "tony@starkindustries.com".into(),
        phone: "+1 (555) 999-8888".into(),
        website: Some("https://starkindustries.com".into()),
        message: "We are looking for a secure CRM solution to manage our defense contracts. \
                  Needs to be air-gapped compliant."
            .into(),
        created_at: at(day(2023, 10, 29), 9, 15),
        status: EnquiryStatus::New,
        hold_reason: None,
        ai_analysis: None,
    }];

    Snapshot {
        enquiries,
        clients,
        follow_ups,
        activities,
        projects,
    }
}

#[cfg(test)]
pub(crate) fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("timestamp")
}

#[cfg(test)]
pub(crate) fn sample_client(id: &str, status: ClientStatus) -> Client {
    client(
        id,
        &format!("Client {id}"),
        &format!("Company {id}"),
        &format!("{id}@example.com"),
        "+91 90000 00000",
        status,
        None,
        "Unknown",
        "",
        day(2023, 11, 1),
        day(2023, 11, 1),
    )
}

#[cfg(test)]
pub(crate) fn sample_enquiry(id: &str, name: &str) -> Enquiry {
    Enquiry {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@starkindustries.com"),
        phone: "+1 (555) 999-8888".into(),
        website: Some("https://starkindustries.com".into()),
        message: "We are looking for a secure CRM solution.".into(),
        created_at: ts("2023-10-29T09:15:00"),
        status: EnquiryStatus::New,
        hold_reason: None,
        ai_analysis: None,
    }
}

#[cfg(test)]
pub(crate) fn sample_follow_up(id: &str, client_id: &str, due: &str) -> FollowUp {
    FollowUp {
        id: id.to_string(),
        client_id: client_id.to_string(),
        title: format!("Follow up {id}"),
        description: None,
        due_date: due.parse().expect("due date"),
        status: FollowUpStatus::Pending,
        priority: Priority::Medium,
    }
}

#[cfg(test)]
pub(crate) fn sample_project(id: &str, client_id: &str, name: &str, created_at: NaiveDateTime) -> Project {
    Project {
        id: id.to_string(),
        client_id: client_id.to_string(),
        name: name.to_string(),
        status: ProjectStatus::Planning,
        category: "Tech".into(),
        priority: Priority::Medium,
        description: String::new(),
        scope_document: None,
        budget: 0.0,
        deadline: None,
        progress: 0,
        created_at,
    }
}
