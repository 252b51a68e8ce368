use chrono::{DateTime, Duration, Utc};
use tracing::info;

use civic_core_types::{
    Category, Priority, Report, ReportDetails, ReportId, ReportStatus, TimelineError,
    ANONYMOUS_SUBMITTER,
};
use civic_intake::route;

use crate::engine::{transition_description, LifecycleEngine};
use crate::errors::LifecycleResult;

pub const DEMO_SUBMITTER: &str = "demo_user";

struct Step {
    to: ReportStatus,
    hours_ago: i64,
    description: &'static str,
}

fn build(
    details: ReportDetails,
    submitted_by: &str,
    now: DateTime<Utc>,
    submitted_hours_ago: i64,
    steps: &[Step],
) -> Result<Report, TimelineError> {
    let submitted_at = now - Duration::hours(submitted_hours_ago);
    let authority = route(&details.category);
    let mut report = Report::submitted(ReportId::new(), details, submitted_by, submitted_at);
    report.mark_routed(authority, submitted_at)?;
    for step in steps {
        report.record_transition(
            step.to,
            now - Duration::hours(step.hours_ago),
            step.description,
        )?;
    }
    Ok(report)
}

/// The two sample reports shown on a fresh install, timestamped relative to
/// `now`.
pub fn demo_reports(now: DateTime<Utc>) -> Result<Vec<Report>, TimelineError> {
    let streetlight = build(
        ReportDetails {
            title: "Broken streetlight on Main Street".into(),
            category: Category::Infrastructure,
            priority: Priority::Medium,
            location: "Main Street & 5th Avenue".into(),
            description: "The streetlight at the intersection of Main Street and 5th Avenue has been broken for over a week, creating a safety hazard for pedestrians and drivers.".into(),
            is_public: true,
            is_anonymous: false,
        },
        DEMO_SUBMITTER,
        now,
        48,
        &[
            Step {
                to: ReportStatus::UnderReview,
                hours_ago: 36,
                description: transition_description(ReportStatus::UnderReview),
            },
            Step {
                to: ReportStatus::InProgress,
                hours_ago: 24,
                description: transition_description(ReportStatus::InProgress),
            },
        ],
    )?;

    let dumping = build(
        ReportDetails {
            title: "Illegal dumping in Central Park".into(),
            category: Category::Environment,
            priority: Priority::High,
            location: "Central Park, North Section".into(),
            description: "Someone has been illegally dumping construction waste in the north section of Central Park. This is damaging the environment and creating an eyesore.".into(),
            is_public: true,
            is_anonymous: true,
        },
        ANONYMOUS_SUBMITTER,
        now,
        120,
        &[
            Step {
                to: ReportStatus::UnderReview,
                hours_ago: 96,
                description: transition_description(ReportStatus::UnderReview),
            },
            Step {
                to: ReportStatus::InProgress,
                hours_ago: 48,
                description: "Cleanup crew dispatched to the location",
            },
            Step {
                to: ReportStatus::Resolved,
                hours_ago: 24,
                description: "Illegal waste removed and area cleaned up",
            },
        ],
    )?;

    Ok(vec![streetlight, dumping])
}

impl LifecycleEngine {
    /// Seeds the demo reports into an empty repository. Returns how many
    /// were inserted.
    pub fn seed_demo(&self) -> LifecycleResult<usize> {
        if !self.repository().is_empty() {
            return Ok(0);
        }
        let reports = demo_reports(self.clock().now())?;
        let count = reports.len();
        for report in reports {
            self.repository().append(report);
        }
        info!(count, "demo reports seeded");
        Ok(count)
    }
}
