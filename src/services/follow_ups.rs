// Follow-ups service
// Scheduling and completion of client follow-ups. Follow-ups never expire:
// an overdue item stays pending until someone acts on it.

use serde::Deserialize;

use super::{new_id, non_blank, position, replace_one, required};
use crate::error::CrmResult;
use crate::types::{Client, DueDate, FollowUp, FollowUpStatus, Priority};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollowUp {
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DueDate,
    #[serde(default)]
    pub priority: Priority,
}

/// Schedule a follow-up for an existing client. New items are pending and
/// listed first.
pub fn add_follow_up(
    follow_ups: &[FollowUp],
    clients: &[Client],
    req: NewFollowUp,
) -> CrmResult<Vec<FollowUp>> {
    position(clients, &req.client_id)?;
    let follow_up = FollowUp {
        id: new_id("f"),
        client_id: req.client_id,
        title: required("title", &req.title)?,
        description: non_blank(req.description),
        due_date: req.due_date,
        status: FollowUpStatus::Pending,
        priority: req.priority,
    };
    log::info!(
        "Scheduled follow-up {} for client {} due {}",
        follow_up.id,
        follow_up.client_id,
        follow_up.due_date
    );

    let mut next = Vec::with_capacity(follow_ups.len() + 1);
    next.push(follow_up);
    next.extend_from_slice(follow_ups);
    Ok(next)
}

/// Flip `pending <-> completed`. Applying it twice restores the original.
pub fn toggle_status(follow_ups: &[FollowUp], id: &str) -> CrmResult<Vec<FollowUp>> {
    replace_one(follow_ups, id, |f| {
        f.status = f.status.flipped();
        log::info!("Follow-up {} is now {}", f.id, f.status);
        Ok(())
    })
}

/// Move a follow-up to a new due date. Status is unchanged.
pub fn reschedule(follow_ups: &[FollowUp], id: &str, due_date: DueDate) -> CrmResult<Vec<FollowUp>> {
    replace_one(follow_ups, id, |f| {
        f.due_date = due_date;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devtools::sample_client;
    use crate::error::CrmError;
    use crate::types::ClientStatus;

    fn request(client_id: &str, title: &str) -> NewFollowUp {
        NewFollowUp {
            client_id: client_id.to_string(),
            title: title.to_string(),
            description: Some("   ".into()),
            due_date: "2023-11-19".parse().unwrap(),
            priority: Priority::High,
        }
    }

    #[test]
    fn test_add_follow_up() {
        let clients = vec![sample_client("c1", ClientStatus::Lead)];
        let follow_ups = add_follow_up(&[], &clients, request("c1", "Send audit report")).unwrap();
        assert_eq!(follow_ups.len(), 1);
        assert!(follow_ups[0].is_pending());
        assert_eq!(follow_ups[0].description, None);
        assert!(follow_ups[0].id.starts_with("f-"));
    }

    #[test]
    fn test_add_follow_up_unknown_client() {
        let err = add_follow_up(&[], &[], request("c1", "Call")).unwrap_err();
        assert!(matches!(err, CrmError::NotFound { entity: "client", .. }));
    }

    #[test]
    fn test_add_follow_up_requires_title() {
        let clients = vec![sample_client("c1", ClientStatus::Lead)];
        let err = add_follow_up(&[], &clients, request("c1", "")).unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "title", .. }));
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let clients = vec![sample_client("c1", ClientStatus::Lead)];
        let follow_ups = add_follow_up(&[], &clients, request("c1", "Call")).unwrap();
        let id = follow_ups[0].id.clone();

        let done = toggle_status(&follow_ups, &id).unwrap();
        assert_eq!(done[0].status, FollowUpStatus::Completed);
        let reopened = toggle_status(&done, &id).unwrap();
        assert_eq!(reopened[0].status, FollowUpStatus::Pending);
    }

    #[test]
    fn test_reschedule() {
        let clients = vec![sample_client("c1", ClientStatus::Lead)];
        let follow_ups = add_follow_up(&[], &clients, request("c1", "Call")).unwrap();
        let id = follow_ups[0].id.clone();
        let due: DueDate = "2023-12-01T15:30:00".parse().unwrap();
        let moved = reschedule(&follow_ups, &id, due).unwrap();
        assert_eq!(moved[0].due_date, due);
        assert!(moved[0].is_pending());
    }
}
