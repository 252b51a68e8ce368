use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DraftId, ReportId, UserId};
use crate::status::{Category, Priority, ReportStatus};

/// Submitter recorded while the client runs disconnected.
pub const OFFLINE_SUBMITTER: &str = "offline_user";
/// Submitter recorded for anonymous reports or when nobody is registered.
pub const ANONYMOUS_SUBMITTER: &str = "anonymous";

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum TimelineError {
    #[error("timeline is empty")]
    Empty,
    #[error("timeline must start with `submitted`, found `{0}`")]
    BadStart(ReportStatus),
    #[error("illegal transition {from} -> {to}")]
    IllegalStep {
        from: ReportStatus,
        to: ReportStatus,
    },
    #[error("status `{status}` disagrees with timeline head `{head}`")]
    StatusMismatch {
        status: ReportStatus,
        head: ReportStatus,
    },
    #[error("report already routed to {0}")]
    AlreadyRouted(String),
}

/// One immutable record of a lifecycle step.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: ReportStatus,
    #[serde(rename = "date", alias = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Raw field bag handed over by the report form. Nothing here is trusted.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportFields {
    pub title: String,
    pub category: String,
    pub priority: String,
    pub location: String,
    pub description: String,
    pub is_public: bool,
    pub is_anonymous: bool,
}

/// Sanitized, validated report content.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    #[serde(flatten)]
    pub details: ReportDetails,
    #[serde(default = "anonymous_submitter")]
    pub submitted_by: String,
    submitted_at: DateTime<Utc>,
    status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    routed_at: Option<DateTime<Utc>>,
    timeline: Vec<TimelineEntry>,
}

fn anonymous_submitter() -> String {
    ANONYMOUS_SUBMITTER.to_string()
}

impl Report {
    pub const SUBMITTED_DESCRIPTION: &'static str = "Report submitted by citizen";

    /// Builds a freshly submitted report with its opening timeline entry.
    pub fn submitted(
        id: ReportId,
        details: ReportDetails,
        submitted_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            submitted_by: submitted_by.into(),
            submitted_at: at,
            status: ReportStatus::Submitted,
            assigned_to: None,
            routed_at: None,
            timeline: vec![TimelineEntry {
                status: ReportStatus::Submitted,
                timestamp: at,
                description: Self::SUBMITTED_DESCRIPTION.to_string(),
            }],
        }
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }

    pub fn category(&self) -> &Category {
        &self.details.category
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.assigned_to.as_deref()
    }

    pub fn routed_at(&self) -> Option<DateTime<Utc>> {
        self.routed_at
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Assigns the responsible authority. Routing happens once and leaves
    /// the visible status untouched.
    pub fn mark_routed(
        &mut self,
        authority: &str,
        at: DateTime<Utc>,
    ) -> Result<(), TimelineError> {
        if let Some(existing) = &self.assigned_to {
            return Err(TimelineError::AlreadyRouted(existing.clone()));
        }
        let head = self.last_entry_status()?;
        if !ReportStatus::Routed.may_follow(head) {
            return Err(TimelineError::IllegalStep {
                from: head,
                to: ReportStatus::Routed,
            });
        }
        self.assigned_to = Some(authority.to_string());
        self.routed_at = Some(at);
        self.timeline.push(TimelineEntry {
            status: ReportStatus::Routed,
            timestamp: at,
            description: format!("Report routed to {authority}"),
        });
        Ok(())
    }

    /// Moves the report to `to`, which must be the next state in the fixed
    /// sequence. Returns the previous status.
    pub fn record_transition(
        &mut self,
        to: ReportStatus,
        at: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Result<ReportStatus, TimelineError> {
        let from = self.status;
        if to == ReportStatus::Routed || from.next() != Some(to) {
            return Err(TimelineError::IllegalStep { from, to });
        }
        self.status = to;
        self.timeline.push(TimelineEntry {
            status: to,
            timestamp: at,
            description: description.into(),
        });
        Ok(from)
    }

    /// Checks the timeline against the state machine. Used on restore,
    /// where the data came from outside the process.
    pub fn validate(&self) -> Result<(), TimelineError> {
        let first = self.timeline.first().ok_or(TimelineError::Empty)?;
        if first.status != ReportStatus::Submitted {
            return Err(TimelineError::BadStart(first.status));
        }
        let mut head = first.status;
        for pair in self.timeline.windows(2) {
            let (prev, next) = (pair[0].status, pair[1].status);
            if !next.may_follow(prev) {
                return Err(TimelineError::IllegalStep {
                    from: prev,
                    to: next,
                });
            }
            if next != ReportStatus::Routed {
                head = next;
            }
        }
        if head != self.status {
            return Err(TimelineError::StatusMismatch {
                status: self.status,
                head,
            });
        }
        Ok(())
    }

    fn last_entry_status(&self) -> Result<ReportStatus, TimelineError> {
        self.timeline
            .last()
            .map(|entry| entry.status)
            .ok_or(TimelineError::Empty)
    }
}

/// Unsubmitted report content saved for later. Drafts are never routed and
/// never enter the lifecycle.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: DraftId,
    #[serde(flatten)]
    pub fields: ReportFields,
    #[serde(default)]
    pub submitted_by: String,
    #[serde(default = "draft_flag")]
    pub is_draft: bool,
    pub saved_at: DateTime<Utc>,
}

fn draft_flag() -> bool {
    true
}

impl Draft {
    pub fn new(fields: ReportFields, submitted_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: DraftId::new(),
            fields,
            submitted_by: submitted_by.into(),
            is_draft: true,
            saved_at: at,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Accessibility and notification preferences stored with the snapshot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub high_contrast: bool,
    pub large_text: bool,
    pub screen_reader: bool,
    pub language: String,
    pub email_notifications: bool,
    pub sms_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            high_contrast: false,
            large_text: false,
            screen_reader: false,
            language: "en".to_string(),
            email_notifications: false,
            sms_notifications: false,
        }
    }
}
