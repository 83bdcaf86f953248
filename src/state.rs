//! Application state: the pipeline snapshot, the single-writer store and
//! config loading.

use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::db::Repository;
use crate::error::{CrmError, CrmResult};
use crate::services::clients::{self, ClientEdits, NewClient, OnboardRequest};
use crate::services::enquiries::{self, EnquiryEdits, NewEnquiry, PromoteRequest};
use crate::services::projects::{self, ProjectDetails};
use crate::services::{activities, follow_ups};
use crate::types::{
    Activity, AiAnalysis, Client, Config, DueDate, Enquiry, FollowUp, LeadType, Project,
    ProjectStatus,
};

/// Every collection the pipeline owns. Order within each list is
/// significant (newest first unless noted).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub enquiries: Vec<Enquiry>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Insertion order.
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Single-writer owner of the snapshot.
///
/// Commands run against the current snapshot and produce a replacement. The
/// replacement is saved through the repository first and only swapped in
/// once the save succeeds, so any error leaves memory and storage unchanged.
pub struct Store {
    repo: Box<dyn Repository>,
    current: Mutex<Snapshot>,
}

impl Store {
    pub fn open(repo: Box<dyn Repository>) -> CrmResult<Self> {
        let snapshot = repo.load()?;
        log::info!(
            "Loaded {} enquiries, {} clients, {} follow-ups from {}",
            snapshot.enquiries.len(),
            snapshot.clients.len(),
            snapshot.follow_ups.len(),
            repo.describe()
        );
        Ok(Self {
            repo,
            current: Mutex::new(snapshot),
        })
    }

    /// Cloned view of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.current.lock().clone()
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    /// Run `command` against the current snapshot and commit its result.
    pub fn apply<F, R>(&self, command: F) -> CrmResult<R>
    where
        F: FnOnce(&Snapshot) -> CrmResult<(Snapshot, R)>,
    {
        let mut current = self.current.lock();
        let (next, out) = command(&*current)?;
        self.repo.save(&next)?;
        log::debug!("Saved snapshot to {}", self.repo.describe());
        *current = next;
        Ok(out)
    }

    /// Replace everything, e.g. with demo data.
    pub fn replace_all(&self, snapshot: Snapshot) -> CrmResult<()> {
        self.apply(|_| Ok((snapshot, ())))
    }

    // -------------------------------------------------------------------------
    // Enquiries
    // -------------------------------------------------------------------------

    pub fn add_enquiry(&self, req: NewEnquiry, now: NaiveDateTime) -> CrmResult<Enquiry> {
        self.apply(|s| {
            let enquiries = enquiries::add_enquiry(&s.enquiries, req, now)?;
            let added = enquiries[0].clone();
            Ok((Snapshot { enquiries, ..s.clone() }, added))
        })
    }

    pub fn mark_enquiry_read(&self, id: &str) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::mark_read(e, id))
    }

    pub fn hold_enquiry(&self, id: &str, reason: &str) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::hold(e, id, reason))
    }

    pub fn dismiss_enquiry(&self, id: &str) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::dismiss(e, id))
    }

    pub fn restore_enquiry(&self, id: &str) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::restore(e, id))
    }

    pub fn delete_enquiry(&self, id: &str) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::delete(e, id))
    }

    pub fn purge_dismissed_enquiries(&self) -> CrmResult<usize> {
        self.apply(|s| {
            let kept = enquiries::purge_dismissed(&s.enquiries);
            let purged = s.enquiries.len() - kept.len();
            Ok((Snapshot { enquiries: kept, ..s.clone() }, purged))
        })
    }

    pub fn update_enquiry(&self, id: &str, edits: EnquiryEdits) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::update(e, id, edits))
    }

    pub fn record_enquiry_analysis(&self, id: &str, analysis: AiAnalysis) -> CrmResult<()> {
        self.update_enquiries(|e| enquiries::record_analysis(e, id, analysis))
    }

    /// Promote an inbox enquiry to a Lead. Returns the new client.
    pub fn promote_enquiry(
        &self,
        id: &str,
        req: PromoteRequest,
        today: NaiveDate,
    ) -> CrmResult<Client> {
        self.apply(|s| {
            let (enquiries, clients) = enquiries::promote(&s.enquiries, &s.clients, id, req, today)?;
            let lead = clients[0].clone();
            Ok((
                Snapshot {
                    enquiries,
                    clients,
                    ..s.clone()
                },
                lead,
            ))
        })
    }

    fn update_enquiries<F>(&self, f: F) -> CrmResult<()>
    where
        F: FnOnce(&[Enquiry]) -> CrmResult<Vec<Enquiry>>,
    {
        self.apply(|s| {
            let enquiries = f(&s.enquiries)?;
            Ok((Snapshot { enquiries, ..s.clone() }, ()))
        })
    }

    // -------------------------------------------------------------------------
    // Clients and leads
    // -------------------------------------------------------------------------

    pub fn add_client(&self, req: NewClient, now: NaiveDateTime) -> CrmResult<Client> {
        self.apply(|s| {
            let (clients, projects) = clients::add_client(&s.clients, &s.projects, req, now)?;
            let added = clients[0].clone();
            Ok((
                Snapshot {
                    clients,
                    projects,
                    ..s.clone()
                },
                added,
            ))
        })
    }

    pub fn add_lead(
        &self,
        req: NewClient,
        lead_type: LeadType,
        now: NaiveDateTime,
    ) -> CrmResult<Client> {
        self.apply(|s| {
            let (clients, projects) =
                clients::add_lead(&s.clients, &s.projects, req, lead_type, now)?;
            let added = clients[0].clone();
            Ok((
                Snapshot {
                    clients,
                    projects,
                    ..s.clone()
                },
                added,
            ))
        })
    }

    pub fn onboard_lead(&self, id: &str, req: OnboardRequest, now: NaiveDateTime) -> CrmResult<()> {
        self.apply(|s| {
            let (clients, projects) = clients::onboard(&s.clients, &s.projects, id, req, now)?;
            Ok((
                Snapshot {
                    clients,
                    projects,
                    ..s.clone()
                },
                (),
            ))
        })
    }

    pub fn dismiss_lead(&self, id: &str) -> CrmResult<()> {
        self.update_clients(|c| clients::dismiss_lead(c, id))
    }

    pub fn restore_lead(&self, id: &str) -> CrmResult<()> {
        self.update_clients(|c| clients::restore_lead(c, id))
    }

    pub fn revert_to_lead(&self, id: &str) -> CrmResult<()> {
        self.update_clients(|c| clients::revert_to_lead(c, id))
    }

    pub fn update_client(&self, id: &str, edits: ClientEdits) -> CrmResult<()> {
        self.update_clients(|c| clients::update_details(c, id, edits))
    }

    /// Hard delete. Follow-ups, activities and projects pointing at the
    /// client are kept.
    pub fn delete_client(&self, id: &str) -> CrmResult<()> {
        self.update_clients(|c| clients::delete_client(c, id))
    }

    fn update_clients<F>(&self, f: F) -> CrmResult<()>
    where
        F: FnOnce(&[Client]) -> CrmResult<Vec<Client>>,
    {
        self.apply(|s| {
            let clients = f(&s.clients)?;
            Ok((Snapshot { clients, ..s.clone() }, ()))
        })
    }

    // -------------------------------------------------------------------------
    // Follow-ups and activities
    // -------------------------------------------------------------------------

    pub fn add_follow_up(&self, req: follow_ups::NewFollowUp) -> CrmResult<FollowUp> {
        self.apply(|s| {
            let follow_ups = follow_ups::add_follow_up(&s.follow_ups, &s.clients, req)?;
            let added = follow_ups[0].clone();
            Ok((Snapshot { follow_ups, ..s.clone() }, added))
        })
    }

    pub fn toggle_follow_up(&self, id: &str) -> CrmResult<()> {
        self.apply(|s| {
            let follow_ups = follow_ups::toggle_status(&s.follow_ups, id)?;
            Ok((Snapshot { follow_ups, ..s.clone() }, ()))
        })
    }

    pub fn reschedule_follow_up(&self, id: &str, due_date: DueDate) -> CrmResult<()> {
        self.apply(|s| {
            let follow_ups = follow_ups::reschedule(&s.follow_ups, id, due_date)?;
            Ok((Snapshot { follow_ups, ..s.clone() }, ()))
        })
    }

    pub fn log_activity(&self, req: activities::NewActivity, now: NaiveDateTime) -> CrmResult<()> {
        self.apply(|s| {
            let activities = activities::log_activity(&s.activities, &s.clients, req, now)?;
            Ok((Snapshot { activities, ..s.clone() }, ()))
        })
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    pub fn add_project(
        &self,
        client_id: &str,
        details: ProjectDetails,
        now: NaiveDateTime,
    ) -> CrmResult<Project> {
        self.apply(|s| {
            let projects = projects::add_project(&s.projects, &s.clients, client_id, details, now)?;
            let added = projects.last().cloned().ok_or_else(|| {
                CrmError::not_found("project", client_id)
            })?;
            Ok((Snapshot { projects, ..s.clone() }, added))
        })
    }

    pub fn move_project(&self, id: &str, status: ProjectStatus) -> CrmResult<()> {
        self.apply(|s| {
            let projects = projects::move_project(&s.projects, id, status)?;
            Ok((Snapshot { projects, ..s.clone() }, ()))
        })
    }

    pub fn set_project_progress(&self, id: &str, progress: u8) -> CrmResult<()> {
        self.apply(|s| {
            let projects = projects::set_progress(&s.projects, id, progress)?;
            Ok((Snapshot { projects, ..s.clone() }, ()))
        })
    }
}

// =============================================================================
// Config
// =============================================================================

/// `~/.leadbook/config.json`.
pub fn config_path() -> CrmResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CrmError::Config("Could not find home directory".into()))?;
    Ok(home.join(".leadbook").join("config.json"))
}

/// Load config from disk (defaults when the file is missing) and apply
/// environment overrides.
pub fn load_config() -> CrmResult<Config> {
    let path = config_path()?;
    let config = if path.exists() {
        let content = fs::read_to_string(&path)
            .map_err(|e| CrmError::Config(format!("Failed to read config: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| CrmError::Config(format!("Failed to parse config: {}", e)))?
    } else {
        log::debug!("No config at {}, using defaults", path.display());
        Config::default()
    };
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// `LEADBOOK_DATA_DIR`, then `GEMINI_API_KEY` falling back to `API_KEY`.
fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = non_empty("LEADBOOK_DATA_DIR") {
        config.data_dir = Some(dir);
    }
    if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
        config.ai.api_key = Some(key);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::devtools::{seed_snapshot, ts};
    use crate::queries::clients::{leads, ClientFilter, LeadView};
    use crate::services::follow_ups::NewFollowUp;
    use crate::types::{ClientStatus, EnquiryStatus, Priority};

    fn now() -> NaiveDateTime {
        ts("2023-11-20T09:00:00")
    }

    fn seeded_store() -> Store {
        Store::open(Box::new(MemoryRepository::with_snapshot(seed_snapshot(now())))).unwrap()
    }

    /// Repository whose saves always fail.
    struct ReadOnlyRepository(Snapshot);

    impl Repository for ReadOnlyRepository {
        fn load(&self) -> Result<Snapshot, crate::db::DbError> {
            Ok(self.0.clone())
        }

        fn save(&self, _: &Snapshot) -> Result<(), crate::db::DbError> {
            Err(crate::db::DbError::Migration("read-only".into()))
        }

        fn describe(&self) -> String {
            "read-only".into()
        }
    }

    #[test]
    fn test_failed_command_leaves_state_unchanged() {
        let store = seeded_store();
        let before = store.snapshot();

        let err = store.hold_enquiry("e1", "   ").unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "holdReason", .. }));
        let err = store.dismiss_lead("missing").unwrap_err();
        assert!(matches!(err, CrmError::NotFound { .. }));

        assert_eq!(store.snapshot(), before);
        assert_eq!(store.repository().load().unwrap(), before);
    }

    #[test]
    fn test_failed_save_leaves_memory_unchanged() {
        let store = Store::open(Box::new(ReadOnlyRepository(seed_snapshot(now())))).unwrap();
        let before = store.snapshot();
        let err = store.dismiss_enquiry("e1").unwrap_err();
        assert!(matches!(err, CrmError::Storage(_)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_promote_tony_stark() {
        let store = seeded_store();
        let lead = store
            .promote_enquiry("e1", PromoteRequest::new(LeadType::Hot), now().date())
            .unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.enquiries.is_empty());
        assert_eq!(snapshot.clients[0].id, lead.id);
        assert_eq!(lead.company, "starkindustries.com");
        assert_eq!(lead.status, ClientStatus::Lead);

        let pending = leads(&snapshot.clients, LeadView::Pending, &ClientFilter::default());
        assert_eq!(pending.len(), 4);
        assert_eq!(store.repository().load().unwrap(), snapshot);
    }

    #[test]
    fn test_onboard_vikram_then_dismiss_and_restore() {
        let store = seeded_store();
        store
            .onboard_lead(
                "c2",
                OnboardRequest {
                    status: ClientStatus::Active,
                    onboarding_date: now().date(),
                    project: ProjectDetails::named("Logistics MVP"),
                },
                now(),
            )
            .unwrap();

        let snapshot = store.snapshot();
        let vikram = snapshot.clients.iter().find(|c| c.id == "c2").unwrap();
        assert_eq!(vikram.status, ClientStatus::Active);
        assert!(vikram.is_converted);
        assert_eq!(vikram.visible_lead_type(), Some(LeadType::Warm));
        assert_eq!(snapshot.projects.len(), 2);

        let converted = leads(&snapshot.clients, LeadView::Converted, &ClientFilter::default());
        assert_eq!(converted.len(), 1);

        store.dismiss_lead("c2").unwrap();
        store.restore_lead("c2").unwrap();
        let vikram = store
            .snapshot()
            .clients
            .into_iter()
            .find(|c| c.id == "c2")
            .unwrap();
        assert_eq!(vikram.status, ClientStatus::Lead);
        assert!(!vikram.is_converted);
    }

    #[test]
    fn test_deleting_client_keeps_follow_ups() {
        let store = seeded_store();
        let err = store.delete_client("c1").unwrap_err();
        assert!(matches!(err, CrmError::InvalidTransition { command: "delete", .. }));

        store.dismiss_lead("c1").unwrap();
        store.delete_client("c1").unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.clients.len(), 3);
        assert_eq!(snapshot.follow_ups.len(), 3);
    }

    #[test]
    fn test_command_return_values() {
        let store = seeded_store();
        let enquiry = store
            .add_enquiry(
                NewEnquiry {
                    name: "Pepper Potts".into(),
                    message: "Leadership training for 40 managers".into(),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(enquiry.status, EnquiryStatus::New);
        assert_eq!(store.snapshot().enquiries[0].id, enquiry.id);

        let follow_up = store
            .add_follow_up(NewFollowUp {
                client_id: "c4".into(),
                title: "Renewal call".into(),
                description: None,
                due_date: DueDate::on(now().date()),
                priority: Priority::High,
            })
            .unwrap();
        store.toggle_follow_up(&follow_up.id).unwrap();
        assert!(!store.snapshot().follow_ups[0].is_pending());

        let project = store
            .add_project("c4", ProjectDetails::named("Enterprise upgrade"), now())
            .unwrap();
        store.move_project(&project.id, ProjectStatus::Completed).unwrap();
        assert_eq!(store.snapshot().projects[1].progress, 100);

        store.dismiss_enquiry(&enquiry.id).unwrap();
        assert_eq!(store.purge_dismissed_enquiries().unwrap(), 1);
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(Config::default(), |key| match key {
            "LEADBOOK_DATA_DIR" => Some("/srv/leadbook".into()),
            "GEMINI_API_KEY" => Some("".into()),
            "API_KEY" => Some("fallback-key".into()),
            _ => None,
        });
        assert_eq!(config.data_dir.as_deref(), Some("/srv/leadbook"));
        assert_eq!(config.ai.api_key.as_deref(), Some("fallback-key"));

        let config = apply_env_overrides(Config::default(), |key| match key {
            "GEMINI_API_KEY" => Some("primary".into()),
            "API_KEY" => Some("fallback-key".into()),
            _ => None,
        });
        assert_eq!(config.ai.api_key.as_deref(), Some("primary"));
        assert_eq!(config.data_dir, None);
    }
}
