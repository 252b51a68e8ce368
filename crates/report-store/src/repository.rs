use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use civic_core_types::{Draft, DraftId, Report, ReportId, Settings, User};

use crate::backend::{MemoryBackend, SnapshotBackend};
use crate::errors::{StoreError, StoreResult};
use crate::query::{sort_newest_first, ReportFilter};
use crate::snapshot::Snapshot;
use crate::stats::DashboardStats;

/// What `restore` found in durable storage.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RestoreOutcome {
    pub reports: usize,
    pub drafts: usize,
    /// Entries that did not parse plus reports whose timeline was malformed.
    pub dropped: usize,
    /// The stored snapshot could not be read and empty state was used.
    pub fell_back_to_empty: bool,
}

/// Sole owner of reports, drafts, the current user and settings.
///
/// Every mutation writes the whole snapshot through to the backend. A failed
/// write is logged and the in-memory state stays authoritative.
pub struct Repository {
    backend: Arc<dyn SnapshotBackend>,
    state: RwLock<Snapshot>,
}

pub type SharedRepository = Arc<Repository>;

impl Repository {
    /// Opens the repository and restores whatever the backend holds.
    pub fn open(backend: Arc<dyn SnapshotBackend>) -> Self {
        let repo = Self {
            backend,
            state: RwLock::new(Snapshot::default()),
        };
        repo.restore();
        repo
    }

    pub fn ephemeral() -> Self {
        Self::open(Arc::new(MemoryBackend::new()))
    }

    pub fn backend_description(&self) -> String {
        self.backend.describe()
    }

    /// Replaces in-memory state with the stored snapshot. Never fails: a
    /// missing, unreadable or corrupt snapshot yields empty state.
    pub fn restore(&self) -> RestoreOutcome {
        let mut outcome = RestoreOutcome::default();
        let loaded = match self.backend.load() {
            Ok(Some(bytes)) => match Snapshot::decode_lenient(&bytes) {
                Ok((snapshot, malformed)) => {
                    outcome.dropped = malformed;
                    snapshot
                }
                Err(err) => {
                    warn!(backend = %self.backend.describe(), error = %err, "snapshot unreadable; starting empty");
                    outcome.fell_back_to_empty = true;
                    Snapshot::default()
                }
            },
            Ok(None) => Snapshot::default(),
            Err(err) => {
                warn!(backend = %self.backend.describe(), error = %err, "snapshot load failed; starting empty");
                outcome.fell_back_to_empty = true;
                Snapshot::default()
            }
        };

        let mut snapshot = loaded;
        outcome.dropped += snapshot.discard_invalid();
        outcome.reports = snapshot.reports.len();
        outcome.drafts = snapshot.drafts.len();
        *self.state.write() = snapshot;
        debug!(
            reports = outcome.reports,
            drafts = outcome.drafts,
            dropped = outcome.dropped,
            "repository restored"
        );
        outcome
    }

    /// Writes the current state to the backend, replacing the old snapshot.
    pub fn persist(&self) -> StoreResult<()> {
        let bytes = self.state.read().encode()?;
        self.backend.save(&bytes)
    }

    fn write_through(&self, snapshot: &Snapshot, op: &'static str) {
        let result = snapshot
            .encode()
            .and_then(|bytes| self.backend.save(&bytes));
        if let Err(err) = result {
            warn!(op, error = %err, "repository persist failed");
        }
    }

    pub fn append(&self, report: Report) {
        let mut state = self.state.write();
        state.reports.push(report);
        self.write_through(&state, "append");
    }

    pub fn append_draft(&self, draft: Draft) {
        let mut state = self.state.write();
        state.drafts.push(draft);
        self.write_through(&state, "append_draft");
    }

    pub fn draft(&self, id: &DraftId) -> Option<Draft> {
        self.state
            .read()
            .drafts
            .iter()
            .find(|draft| &draft.id == id)
            .cloned()
    }

    pub fn drafts(&self) -> Vec<Draft> {
        self.state.read().drafts.clone()
    }

    /// Removes and returns a draft.
    pub fn take_draft(&self, id: &DraftId) -> StoreResult<Draft> {
        let mut state = self.state.write();
        let pos = state
            .drafts
            .iter()
            .position(|draft| &draft.id == id)
            .ok_or_else(|| StoreError::DraftNotFound(id.to_string()))?;
        let draft = state.drafts.remove(pos);
        self.write_through(&state, "take_draft");
        Ok(draft)
    }

    pub fn remove(&self, id: &ReportId) -> StoreResult<Report> {
        let mut state = self.state.write();
        let pos = state
            .reports
            .iter()
            .position(|report| &report.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let report = state.reports.remove(pos);
        self.write_through(&state, "remove");
        Ok(report)
    }

    pub fn find(&self, id: &ReportId) -> Option<Report> {
        self.state
            .read()
            .reports
            .iter()
            .find(|report| &report.id == id)
            .cloned()
    }

    /// Reports in insertion order.
    pub fn all(&self) -> Vec<Report> {
        self.state.read().reports.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().reports.is_empty()
    }

    pub fn filtered<F>(&self, predicate: F) -> Vec<Report>
    where
        F: Fn(&Report) -> bool,
    {
        self.state
            .read()
            .reports
            .iter()
            .filter(|report| predicate(report))
            .cloned()
            .collect()
    }

    /// Filtered view sorted newest first, as the tracking list shows it.
    pub fn search(&self, filter: &ReportFilter) -> Vec<Report> {
        let mut hits = self.filtered(|report| filter.matches(report));
        sort_newest_first(&mut hits);
        hits
    }

    /// Ids of non-terminal reports, in insertion order.
    pub fn pending_ids(&self) -> Vec<ReportId> {
        self.state
            .read()
            .reports
            .iter()
            .filter(|report| report.is_pending())
            .map(|report| report.id.clone())
            .collect()
    }

    /// Runs `mutate` against the stored report and persists.
    pub fn update<F, T>(&self, id: &ReportId, mutate: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Report) -> T,
    {
        let mut state = self.state.write();
        let report = state
            .reports
            .iter_mut()
            .find(|report| &report.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let out = mutate(report);
        self.write_through(&state, "update");
        Ok(out)
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.read().current_user.clone()
    }

    pub fn set_current_user(&self, user: Option<User>) {
        let mut state = self.state.write();
        state.current_user = user;
        self.write_through(&state, "set_current_user");
    }

    pub fn settings(&self) -> Settings {
        self.state.read().settings.clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        let mut state = self.state.write();
        state.settings = settings;
        self.write_through(&state, "update_settings");
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.read().clone()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(&self.state.read().reports)
    }

    /// Drops all state and removes the durable snapshot.
    pub fn clear(&self) -> StoreResult<()> {
        *self.state.write() = Snapshot::default();
        self.backend.clear()?;
        info!(backend = %self.backend.describe(), "repository cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileBackend;
    use chrono::{TimeZone, Utc};
    use civic_core_types::{
        Category, Priority, ReportDetails, ReportFields, ReportStatus, UserId,
    };

    fn report(title: &str) -> Report {
        Report::submitted(
            ReportId::new(),
            ReportDetails {
                title: title.into(),
                category: Category::Transportation,
                priority: Priority::High,
                location: "Bus stop 12".into(),
                description: "The shelter roof collapsed during the storm.".into(),
                is_public: true,
                is_anonymous: false,
            },
            "anonymous",
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        )
    }

    fn user() -> User {
        User {
            id: UserId::from("u-1"),
            name: "Ada".into(),
            email: "ada@example.org".into(),
            phone: None,
            location: Some("Ward 3".into()),
            registered_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            is_verified: true,
        }
    }

    #[test]
    fn every_mutation_is_written_through() {
        let backend = Arc::new(MemoryBackend::new());
        let repo = Repository::open(backend.clone());
        assert!(backend.raw().is_none());

        let r = report("Bus shelter damaged");
        let id = r.id.clone();
        repo.append(r);
        let stored = Snapshot::decode(&backend.raw().unwrap()).unwrap();
        assert_eq!(stored.reports.len(), 1);

        repo.update(&id, |report| {
            let at = report.submitted_at();
            report
                .record_transition(ReportStatus::UnderReview, at, "review")
                .unwrap();
        })
        .unwrap();
        let stored = Snapshot::decode(&backend.raw().unwrap()).unwrap();
        assert_eq!(stored.reports[0].status(), ReportStatus::UnderReview);
    }

    #[test]
    fn round_trip_through_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civic.json");
        let repo = Repository::open(Arc::new(FileBackend::new(&path)));

        let mut routed = report("Traffic light stuck");
        let at = routed.submitted_at();
        routed.mark_routed("Transportation Department", at).unwrap();
        repo.append(routed);
        repo.append_draft(Draft::new(
            ReportFields {
                title: "Half-written".into(),
                ..ReportFields::default()
            },
            "anonymous",
            at,
        ));
        repo.set_current_user(Some(user()));
        repo.update_settings(Settings {
            large_text: true,
            language: "es".into(),
            ..Settings::default()
        });
        let before = repo.snapshot();

        let reopened = Repository::open(Arc::new(FileBackend::new(&path)));
        assert_eq!(reopened.snapshot(), before);
    }

    #[test]
    fn corrupt_snapshot_restores_empty() {
        let repo = Repository::open(Arc::new(MemoryBackend::with_bytes("{{{ nope")));
        assert!(repo.is_empty());
        let outcome = repo.restore();
        assert!(outcome.fell_back_to_empty);
        assert_eq!(outcome.reports, 0);
    }

    #[test]
    fn one_unreadable_report_does_not_wipe_the_snapshot() {
        let raw = r#"{
            "reports": [
                {"id": "good1", "title": "Leaking hydrant", "category": "public-services",
                 "description": "Water has been running down the street since Monday.",
                 "submittedBy": "u-1", "submittedAt": "2024-05-01T10:00:00Z", "status": "submitted",
                 "timeline": [{"status": "submitted", "date": "2024-05-01T10:00:00Z", "description": "s"}]},
                {"id": "good2", "title": "Faded crosswalk", "category": "transportation",
                 "description": "The crosswalk paint outside the school is gone.",
                 "submittedAt": "2024-05-02T10:00:00Z", "status": "submitted",
                 "timeline": [{"status": "submitted", "date": "2024-05-02T10:00:00Z", "description": "s"}]},
                {"id": "broken", "title": ["not", "text"]}
            ],
            "settings": {"language": "fr"}
        }"#;
        let backend = Arc::new(MemoryBackend::with_bytes(raw));
        let repo = Repository::open(backend.clone());

        let outcome = repo.restore();
        assert!(!outcome.fell_back_to_empty);
        assert_eq!(outcome.reports, 2);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(repo.settings().language, "fr");

        let mut settings = repo.settings();
        settings.large_text = true;
        repo.update_settings(settings);
        let stored = Snapshot::decode(&backend.raw().unwrap()).unwrap();
        let ids: Vec<&str> = stored.reports.iter().map(|report| report.id.as_ref()).collect();
        assert_eq!(ids, vec!["good1", "good2"]);
        assert_eq!(stored.reports[1].submitted_by, "anonymous");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let repo = Repository::ephemeral();
        let err = repo.update(&ReportId::from("missing"), |_| ()).unwrap_err();
        assert_eq!(err, StoreError::NotFound("missing".into()));
    }

    #[test]
    fn take_draft_removes_it() {
        let repo = Repository::ephemeral();
        let draft = Draft::new(ReportFields::default(), "anonymous", Utc::now());
        let id = draft.id.clone();
        repo.append_draft(draft);
        assert!(repo.draft(&id).is_some());
        repo.take_draft(&id).unwrap();
        assert!(repo.drafts().is_empty());
        assert!(matches!(
            repo.take_draft(&id),
            Err(StoreError::DraftNotFound(_))
        ));
    }

    #[test]
    fn pending_ids_follow_insertion_order() {
        let repo = Repository::ephemeral();
        let first = report("First report");
        let second = report("Second report");
        let ids = vec![first.id.clone(), second.id.clone()];
        repo.append(first);
        repo.append(second);
        assert_eq!(repo.pending_ids(), ids);
    }

    #[test]
    fn clear_wipes_memory_and_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let repo = Repository::open(backend.clone());
        repo.append(report("Something to wipe"));
        repo.set_current_user(Some(user()));
        repo.clear().unwrap();
        assert!(repo.is_empty());
        assert!(repo.current_user().is_none());
        assert!(backend.raw().is_none());
    }
}
