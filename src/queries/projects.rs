//! Project board projections.

use serde::Serialize;

use crate::types::{Project, ProjectStatus};

/// One board column.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn<'a> {
    pub stage: ProjectStatus,
    pub projects: Vec<&'a Project>,
}

/// Projects grouped into the four stages, in board order. Within a column
/// projects keep insertion order.
pub fn board(projects: &[Project]) -> Vec<BoardColumn<'_>> {
    ProjectStatus::STAGES
        .iter()
        .map(|&stage| BoardColumn {
            stage,
            projects: in_stage(projects, stage),
        })
        .collect()
}

pub fn in_stage(projects: &[Project], stage: ProjectStatus) -> Vec<&Project> {
    projects.iter().filter(|p| p.status == stage).collect()
}

/// Projects belonging to one client, oldest first.
pub fn for_client<'a>(projects: &'a [Project], client_id: &str) -> Vec<&'a Project> {
    let mut out: Vec<&Project> = projects
        .iter()
        .filter(|p| p.client_id == client_id)
        .collect();
    out.sort_by_key(|p| p.created_at);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devtools::{sample_project, ts};

    #[test]
    fn test_board_has_every_stage_in_order() {
        let mut review = sample_project("p2", "c1", "Rollout", ts("2023-11-02T09:00:00"));
        review.status = ProjectStatus::Review;
        let projects = vec![
            sample_project("p1", "c1", "Audit", ts("2023-11-01T09:00:00")),
            review,
        ];

        let columns = board(&projects);
        let stages: Vec<ProjectStatus> = columns.iter().map(|c| c.stage).collect();
        assert_eq!(stages, ProjectStatus::STAGES.to_vec());
        assert_eq!(columns[0].projects.len(), 1);
        assert!(columns[1].projects.is_empty());
        assert_eq!(columns[2].projects[0].id, "p2");
    }

    #[test]
    fn test_for_client_orders_oldest_first() {
        let projects = vec![
            sample_project("p2", "c1", "Later", ts("2023-12-01T09:00:00")),
            sample_project("p1", "c1", "Earlier", ts("2023-11-01T09:00:00")),
            sample_project("p3", "c2", "Other", ts("2023-10-01T09:00:00")),
        ];
        let ids: Vec<&str> = for_client(&projects, "c1").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }
}
