//! Dashboard cards and sidebar badges.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::enquiries::{inbox_count, unread_count};
use super::follow_ups::{bucket_counts, classify, count_pending_by, FollowUpBucket};
use crate::state::Snapshot;
use crate::types::{Client, ClientStatus, FollowUp};

/// Active clients as a whole percentage of the Lead + Active pool, rounded
/// half up. 0 when the pool is empty.
pub fn engagement_rate(clients: &[Client]) -> u32 {
    let active = clients
        .iter()
        .filter(|c| c.status == ClientStatus::Active)
        .count() as u64;
    let leads = clients
        .iter()
        .filter(|c| c.status == ClientStatus::Lead)
        .count() as u64;
    let pool = active + leads;
    if pool == 0 {
        return 0;
    }
    ((200 * active + pool) / (2 * pool)) as u32
}

/// Pending follow-ups due today.
pub fn today_tasks(follow_ups: &[FollowUp], now: NaiveDateTime) -> Vec<&FollowUp> {
    follow_ups
        .iter()
        .filter(|f| classify(f, now) == Some(FollowUpBucket::Today))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Enquiries with status `new`.
    pub new_enquiries: usize,
    pub today_tasks: usize,
    /// Pending and overdue.
    pub missed_tasks: usize,
    /// New enquiries plus tasks due today plus missed tasks.
    pub total_notifications: usize,
    pub lead_count: usize,
    pub active_count: usize,
    pub engagement_rate: u32,
    pub badges: SidebarBadges,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarBadges {
    /// `new` and `read` enquiries.
    pub enquiries: usize,
    /// Every pending follow-up, orphans included.
    pub follow_ups: usize,
    /// Pending follow-ups linked to an `Active` client.
    pub client_follow_ups: usize,
    /// Pending follow-ups linked to a `Lead`.
    pub lead_follow_ups: usize,
}

pub fn summarize(snapshot: &Snapshot, now: NaiveDateTime) -> DashboardSummary {
    let counts = bucket_counts(&snapshot.follow_ups, now);
    let new_enquiries = unread_count(&snapshot.enquiries);
    let count_status = |status: ClientStatus| {
        snapshot
            .clients
            .iter()
            .filter(|c| c.status == status)
            .count()
    };

    DashboardSummary {
        new_enquiries,
        today_tasks: counts.today,
        missed_tasks: counts.overdue,
        total_notifications: new_enquiries + counts.today + counts.overdue,
        lead_count: count_status(ClientStatus::Lead),
        active_count: count_status(ClientStatus::Active),
        engagement_rate: engagement_rate(&snapshot.clients),
        badges: SidebarBadges {
            enquiries: inbox_count(&snapshot.enquiries),
            follow_ups: counts.pending(),
            client_follow_ups: count_pending_by(&snapshot.follow_ups, &snapshot.clients, |c| {
                c.status == ClientStatus::Active
            }),
            lead_follow_ups: count_pending_by(&snapshot.follow_ups, &snapshot.clients, |c| {
                c.status == ClientStatus::Lead
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devtools::{sample_client, seed_snapshot, ts};

    fn roster(active: usize, leads: usize) -> Vec<Client> {
        let mut clients = Vec::new();
        for i in 0..active {
            clients.push(sample_client(&format!("a{i}"), ClientStatus::Active));
        }
        for i in 0..leads {
            clients.push(sample_client(&format!("l{i}"), ClientStatus::Lead));
        }
        clients
    }

    #[test]
    fn test_engagement_rate_empty_pool() {
        assert_eq!(engagement_rate(&[]), 0);
        assert_eq!(
            engagement_rate(&[sample_client("c1", ClientStatus::Churned)]),
            0
        );
    }

    #[test]
    fn test_engagement_rate_rounds_half_up() {
        assert_eq!(engagement_rate(&roster(3, 1)), 75);
        assert_eq!(engagement_rate(&roster(1, 2)), 33);
        assert_eq!(engagement_rate(&roster(2, 1)), 67);
        // 1/8 = 12.5%
        assert_eq!(engagement_rate(&roster(1, 7)), 13);
        assert_eq!(engagement_rate(&roster(0, 4)), 0);
        assert_eq!(engagement_rate(&roster(4, 0)), 100);
    }

    #[test]
    fn test_summary_of_seed_data() {
        let now = ts("2023-11-20T09:00:00");
        let snapshot = seed_snapshot(now);
        let summary = summarize(&snapshot, now);

        assert_eq!(summary.new_enquiries, 1);
        assert_eq!(summary.today_tasks, 1);
        assert_eq!(summary.missed_tasks, 1);
        assert_eq!(summary.total_notifications, 3);
        assert_eq!(summary.lead_count, 3);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.engagement_rate, 25);
        assert_eq!(summary.badges.enquiries, 1);
        assert_eq!(summary.badges.follow_ups, 3);
        assert_eq!(summary.badges.lead_follow_ups, 3);
        assert_eq!(summary.badges.client_follow_ups, 0);
        assert_eq!(today_tasks(&snapshot.follow_ups, now).len(), 1);
    }

    #[test]
    fn test_notifications_include_missed_tasks() {
        let now = ts("2023-11-20T09:00:00");
        let mut snapshot = seed_snapshot(now);
        snapshot.enquiries.clear();
        for follow_up in &mut snapshot.follow_ups {
            follow_up.due_date = "2023-11-18".parse().unwrap();
        }

        let summary = summarize(&snapshot, now);
        assert_eq!(summary.new_enquiries, 0);
        assert_eq!(summary.today_tasks, 0);
        assert_eq!(summary.missed_tasks, 3);
        assert_eq!(summary.total_notifications, 3);
    }
}
