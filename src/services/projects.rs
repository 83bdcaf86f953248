// Projects service
// Project board commands. Projects are the single holder of project
// attributes; client onboarding creates them through `ProjectDetails`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::{new_id, non_blank, position, replace_one, required};
use crate::error::CrmResult;
use crate::types::{Client, Priority, Project, ProjectStatus};

/// Project fields supplied when onboarding a client or adding to the board.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub scope_document: Option<String>,
    #[serde(default)]
    pub budget: f64,
}

impl ProjectDetails {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Validate and build the project record for `client_id`.
    pub(crate) fn into_project(self, client_id: &str, now: NaiveDateTime) -> CrmResult<Project> {
        let name = required("projectName", &self.name)?;
        Ok(Project {
            id: new_id("p"),
            client_id: client_id.to_string(),
            name,
            status: self.status,
            category: non_blank(self.category).unwrap_or_else(|| "Tech".to_string()),
            priority: self.priority,
            description: self.description.trim().to_string(),
            scope_document: non_blank(self.scope_document),
            budget: self.budget.max(0.0),
            deadline: self.deadline,
            progress: 0,
            created_at: now,
        })
    }
}

/// Add a project for an existing client.
pub fn add_project(
    projects: &[Project],
    clients: &[Client],
    client_id: &str,
    details: ProjectDetails,
    now: NaiveDateTime,
) -> CrmResult<Vec<Project>> {
    position(clients, client_id)?;
    let project = details.into_project(client_id, now)?;
    log::info!("Added project {} for client {}", project.id, client_id);

    let mut next = projects.to_vec();
    next.push(project);
    Ok(next)
}

/// Move a project to another board stage. Completing a project sets its
/// progress to 100.
pub fn move_project(
    projects: &[Project],
    id: &str,
    status: ProjectStatus,
) -> CrmResult<Vec<Project>> {
    let next = replace_one(projects, id, |project| {
        project.status = status;
        if status == ProjectStatus::Completed {
            project.progress = 100;
        }
        Ok(())
    })?;
    log::info!("Moved project {} to {}", id, status);
    Ok(next)
}

/// Record delivery progress, clamped to 0..=100.
pub fn set_progress(projects: &[Project], id: &str, progress: u8) -> CrmResult<Vec<Project>> {
    replace_one(projects, id, |project| {
        project.progress = progress.min(100);
        Ok(())
    })
}
