use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use civic_core_types::{
    Clock, Draft, DraftId, Report, ReportFields, ReportId, ReportStatus, Settings, SystemClock,
    User, UserId, ANONYMOUS_SUBMITTER, OFFLINE_SUBMITTER,
};
use civic_intake::{route, Registration, Validator};
use civic_report_store::{Repository, SharedRepository};

use crate::errors::{LifecycleError, LifecycleResult};
use crate::events::{EventBus, LifecycleEvent};
use crate::metrics;

/// Result of a single `advance` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced {
        from: ReportStatus,
        to: ReportStatus,
    },
    AlreadyResolved,
}

/// Timeline text for a step into `to`.
pub fn transition_description(to: ReportStatus) -> &'static str {
    match to {
        ReportStatus::Submitted => Report::SUBMITTED_DESCRIPTION,
        ReportStatus::Routed => "Report routed to an authority",
        ReportStatus::UnderReview => "Report is being reviewed by authorities",
        ReportStatus::InProgress => "Authorities have started working on this issue",
        ReportStatus::Resolved => "Issue has been successfully resolved",
    }
}

/// Owns every state change a report goes through. Reads go straight to the
/// repository via [`LifecycleEngine::repository`].
pub struct LifecycleEngine {
    repo: SharedRepository,
    validator: Validator,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    offline: AtomicBool,
}

impl LifecycleEngine {
    pub fn new(repo: SharedRepository, validator: Validator, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            validator,
            clock,
            events: Arc::new(EventBus::default()),
            offline: AtomicBool::new(false),
        }
    }

    /// In-memory engine with default rules and the system clock.
    pub fn ephemeral() -> Self {
        Self::new(
            Arc::new(Repository::ephemeral()),
            Validator::default(),
            SystemClock::shared(),
        )
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn repository(&self) -> &SharedRepository {
        &self.repo
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    fn submitter(&self, anonymous: bool) -> String {
        if self.is_offline() {
            return OFFLINE_SUBMITTER.to_string();
        }
        match self.repo.current_user() {
            Some(user) if !anonymous => user.id.to_string(),
            _ => ANONYMOUS_SUBMITTER.to_string(),
        }
    }

    /// Validates, routes and stores a new report.
    pub fn submit(&self, fields: &ReportFields) -> LifecycleResult<Report> {
        let details = self.validator.validate(fields)?;
        let at = self.clock.now();
        let submitted_by = self.submitter(details.is_anonymous);
        let mut report = Report::submitted(ReportId::new(), details, submitted_by, at);
        let authority = route(report.category());
        report.mark_routed(authority, at)?;

        self.repo.append(report.clone());
        metrics::record_submitted();
        info!(
            report_id = %report.id,
            category = %report.category(),
            authority,
            "report submitted"
        );
        self.events.publish(LifecycleEvent::Submitted {
            report_id: report.id.clone(),
            authority: authority.to_string(),
            at,
        });
        Ok(report)
    }

    /// Moves a report one step along the fixed sequence. A resolved report
    /// is left untouched.
    pub fn advance(&self, id: &ReportId) -> LifecycleResult<AdvanceOutcome> {
        let current = self
            .repo
            .find(id)
            .ok_or_else(|| LifecycleError::NotFound(id.clone()))?;
        let Some(to) = current.status().next() else {
            debug!(report_id = %id, "advance skipped; report already resolved");
            return Ok(AdvanceOutcome::AlreadyResolved);
        };

        let at = self.clock.now();
        let from = self
            .repo
            .update(id, |report| {
                report.record_transition(to, at, transition_description(to))
            })??;

        metrics::record_advanced();
        debug!(report_id = %id, from = %from, to = %to, "report advanced");
        self.events.publish(LifecycleEvent::Advanced {
            report_id: id.clone(),
            from,
            to,
            at,
        });
        if to.is_terminal() {
            metrics::record_resolved();
            info!(report_id = %id, title = current.title(), "report resolved");
            self.events.publish(LifecycleEvent::Resolved {
                report_id: id.clone(),
                title: current.title().to_string(),
                at,
            });
        }
        Ok(AdvanceOutcome::Advanced { from, to })
    }

    /// Stores the sanitized form content for later. Nothing is validated.
    pub fn save_draft(&self, fields: &ReportFields) -> Draft {
        let clean = self.validator.sanitize_fields(fields);
        let submitted_by = self.submitter(clean.is_anonymous);
        let draft = Draft::new(clean, submitted_by, self.clock.now());
        self.repo.append_draft(draft.clone());
        metrics::record_draft_saved();
        debug!(draft_id = %draft.id, "draft saved");
        self.events.publish(LifecycleEvent::DraftSaved {
            draft_id: draft.id.clone(),
            at: draft.saved_at,
        });
        draft
    }

    /// Submits a draft's content. The draft is removed only when the
    /// submission succeeds.
    pub fn submit_draft(&self, id: &DraftId) -> LifecycleResult<Report> {
        let draft = self
            .repo
            .draft(id)
            .ok_or_else(|| LifecycleError::DraftNotFound(id.clone()))?;
        let report = self.submit(&draft.fields)?;
        self.repo.take_draft(id)?;
        Ok(report)
    }

    pub fn discard_draft(&self, id: &DraftId) -> LifecycleResult<Draft> {
        Ok(self.repo.take_draft(id)?)
    }

    /// Deletes a report. Scheduled advances for it turn into no-ops.
    pub fn remove(&self, id: &ReportId) -> LifecycleResult<Report> {
        let report = self.repo.remove(id)?;
        info!(report_id = %id, "report removed");
        Ok(report)
    }

    /// Registers and signs in a citizen. Registered users count as verified.
    pub fn register_user(&self, registration: &Registration) -> LifecycleResult<User> {
        let clean = self.validator.validate_registration(registration)?;
        let user = User {
            id: UserId::new(),
            name: clean.name,
            email: clean.email,
            phone: clean.phone,
            location: clean.location,
            registered_at: self.clock.now(),
            is_verified: true,
        };
        self.repo.set_current_user(Some(user.clone()));
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Signs out and wipes everything stored on this device.
    pub fn logout(&self) -> LifecycleResult<()> {
        self.repo.clear()?;
        info!("signed out; local data cleared");
        Ok(())
    }

    pub fn update_settings(&self, settings: Settings) {
        self.repo.update_settings(settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use civic_core_types::ManualClock;
    use civic_report_store::MemoryBackend;

    fn engine() -> (LifecycleEngine, Arc<ManualClock>) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let repo = Arc::new(Repository::open(Arc::new(MemoryBackend::new())));
        (
            LifecycleEngine::new(repo, Validator::default(), clock.clone()),
            clock,
        )
    }

    fn pothole() -> ReportFields {
        ReportFields {
            title: "Pothole on Oak St".into(),
            category: "infrastructure".into(),
            description: "A large pothole has formed near the school crossing.".into(),
            is_public: true,
            ..ReportFields::default()
        }
    }

    #[test]
    fn submit_routes_without_changing_status() {
        let (engine, _) = engine();
        let report = engine.submit(&pothole()).unwrap();
        assert_eq!(report.status(), ReportStatus::Submitted);
        assert_eq!(
            report.assigned_to(),
            Some("Municipal Public Works Department")
        );
        assert_eq!(report.timeline().len(), 2);
        assert_eq!(report.timeline()[1].status, ReportStatus::Routed);
        assert_eq!(report.submitted_by, ANONYMOUS_SUBMITTER);
        assert_eq!(engine.repository().find(&report.id), Some(report));
    }

    #[test]
    fn invalid_submission_stores_nothing() {
        let (engine, _) = engine();
        let err = engine
            .submit(&ReportFields {
                title: "Hole".into(),
                ..pothole()
            })
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert!(engine.repository().is_empty());
    }

    #[test]
    fn advance_walks_the_sequence_and_stops() {
        let (engine, clock) = engine();
        let id = engine.submit(&pothole()).unwrap().id;
        let expected = [
            (ReportStatus::Submitted, ReportStatus::UnderReview),
            (ReportStatus::UnderReview, ReportStatus::InProgress),
            (ReportStatus::InProgress, ReportStatus::Resolved),
        ];
        for (from, to) in expected {
            clock.advance(chrono::Duration::minutes(5));
            assert_eq!(
                engine.advance(&id).unwrap(),
                AdvanceOutcome::Advanced { from, to }
            );
        }
        let resolved = engine.repository().find(&id).unwrap();
        assert_eq!(
            engine.advance(&id).unwrap(),
            AdvanceOutcome::AlreadyResolved
        );
        assert_eq!(engine.repository().find(&id).unwrap(), resolved);
        assert_eq!(resolved.timeline().len(), 5);
        assert_eq!(
            resolved.timeline().last().map(|entry| entry.description.as_str()),
            Some("Issue has been successfully resolved")
        );
    }

    #[test]
    fn advance_unknown_id_is_not_found() {
        let (engine, _) = engine();
        let missing = ReportId::from("nope");
        assert_eq!(
            engine.advance(&missing).unwrap_err(),
            LifecycleError::NotFound(missing)
        );
    }

    #[test]
    fn submitter_follows_user_offline_and_anonymity() {
        let (engine, _) = engine();
        let user = engine
            .register_user(&Registration {
                name: "Grace".into(),
                email: "grace@example.org".into(),
                ..Registration::default()
            })
            .unwrap();
        assert!(user.is_verified);
        assert_eq!(engine.submit(&pothole()).unwrap().submitted_by, user.id.0);

        let anonymous = ReportFields {
            is_anonymous: true,
            ..pothole()
        };
        assert_eq!(
            engine.submit(&anonymous).unwrap().submitted_by,
            ANONYMOUS_SUBMITTER
        );

        engine.set_offline(true);
        assert_eq!(
            engine.submit(&pothole()).unwrap().submitted_by,
            OFFLINE_SUBMITTER
        );
    }

    #[test]
    fn draft_kept_when_submission_fails() {
        let (engine, _) = engine();
        let draft = engine.save_draft(&ReportFields {
            title: "Pot".into(),
            ..ReportFields::default()
        });
        assert!(draft.is_draft);
        assert!(matches!(
            engine.submit_draft(&draft.id),
            Err(LifecycleError::Validation(_))
        ));
        assert_eq!(engine.repository().drafts().len(), 1);
    }

    #[test]
    fn draft_removed_after_submission() {
        let (engine, _) = engine();
        let draft = engine.save_draft(&pothole());
        let report = engine.submit_draft(&draft.id).unwrap();
        assert_eq!(report.title(), "Pothole on Oak St");
        assert!(engine.repository().drafts().is_empty());
        assert!(matches!(
            engine.discard_draft(&draft.id),
            Err(LifecycleError::DraftNotFound(_))
        ));
    }

    #[test]
    fn registration_requires_name_and_email() {
        let (engine, _) = engine();
        let err = engine
            .register_user(&Registration {
                name: "  ".into(),
                email: "x@example.org".into(),
                ..Registration::default()
            })
            .unwrap_err();
        assert_eq!(err.user_messages(), vec!["Name and email are required."]);
        assert!(engine.repository().current_user().is_none());
    }

    #[test]
    fn logout_clears_everything() {
        let (engine, _) = engine();
        engine.submit(&pothole()).unwrap();
        engine
            .register_user(&Registration {
                name: "Grace".into(),
                email: "grace@example.org".into(),
                ..Registration::default()
            })
            .unwrap();
        engine.logout().unwrap();
        assert!(engine.repository().is_empty());
        assert!(engine.repository().current_user().is_none());
    }

    #[test]
    fn submit_publishes_event() {
        let (engine, _) = engine();
        let mut rx = engine.events().subscribe();
        let report = engine.submit(&pothole()).unwrap();
        match rx.try_recv().unwrap() {
            LifecycleEvent::Submitted {
                report_id,
                authority,
                ..
            } => {
                assert_eq!(report_id, report.id);
                assert_eq!(authority, "Municipal Public Works Department");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
