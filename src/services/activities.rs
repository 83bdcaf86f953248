// Activities service
// Append-only interaction log. There is no update or delete.

use chrono::NaiveDateTime;
use serde::Deserialize;

use super::{new_id, position, required};
use crate::error::CrmResult;
use crate::types::{Activity, Client, InteractionType};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub client_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub description: String,
}

/// Log an interaction with an existing client, newest first.
pub fn log_activity(
    activities: &[Activity],
    clients: &[Client],
    req: NewActivity,
    now: NaiveDateTime,
) -> CrmResult<Vec<Activity>> {
    position(clients, &req.client_id)?;
    let activity = Activity {
        id: new_id("a"),
        client_id: req.client_id,
        kind: req.kind,
        description: required("description", &req.description)?,
        timestamp: now,
    };
    log::info!("Logged {} for client {}", activity.kind, activity.client_id);

    let mut next = Vec::with_capacity(activities.len() + 1);
    next.push(activity);
    next.extend_from_slice(activities);
    Ok(next)
}

/// Activities for one client, newest first.
pub fn for_client<'a>(activities: &'a [Activity], client_id: &str) -> Vec<&'a Activity> {
    let mut out: Vec<&Activity> = activities
        .iter()
        .filter(|a| a.client_id == client_id)
        .collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devtools::{sample_client, ts};
    use crate::error::CrmError;
    use crate::types::ClientStatus;

    #[test]
    fn test_log_activity_prepends() {
        let clients = vec![sample_client("c1", ClientStatus::Active)];
        let first = log_activity(
            &[],
            &clients,
            NewActivity {
                client_id: "c1".into(),
                kind: InteractionType::Email,
                description: "Sent weekly report".into(),
            },
            ts("2023-10-25T14:30:00"),
        )
        .unwrap();
        let second = log_activity(
            &first,
            &clients,
            NewActivity {
                client_id: "c1".into(),
                kind: InteractionType::Call,
                description: "Intro call".into(),
            },
            ts("2023-10-28T10:00:00"),
        )
        .unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].kind, InteractionType::Call);
        assert_eq!(second[1].kind, InteractionType::Email);
    }

    #[test]
    fn test_log_activity_requires_description() {
        let clients = vec![sample_client("c1", ClientStatus::Active)];
        let err = log_activity(
            &[],
            &clients,
            NewActivity {
                client_id: "c1".into(),
                kind: InteractionType::Note,
                description: "  ".into(),
            },
            ts("2023-10-25T14:30:00"),
        )
        .unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "description", .. }));
    }

    #[test]
    fn test_for_client_filters_and_orders() {
        let clients = vec![
            sample_client("c1", ClientStatus::Active),
            sample_client("c2", ClientStatus::Lead),
        ];
        let mut log = Vec::new();
        for (client, at) in [
            ("c1", "2023-10-01T09:00:00"),
            ("c2", "2023-10-02T09:00:00"),
            ("c1", "2023-10-03T09:00:00"),
        ] {
            log = log_activity(
                &log,
                &clients,
                NewActivity {
                    client_id: client.into(),
                    kind: InteractionType::Meeting,
                    description: format!("Met {client}"),
                },
                ts(at),
            )
            .unwrap();
        }
        let c1 = for_client(&log, "c1");
        assert_eq!(c1.len(), 2);
        assert_eq!(c1[0].timestamp, ts("2023-10-03T09:00:00"));
    }
}
