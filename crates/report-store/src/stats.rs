use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use civic_core_types::{Report, ReportId, ReportStatus};

use crate::query::sort_newest_first;

pub const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Clone, Debug, Serialize)]
pub struct ActivityItem {
    pub id: ReportId,
    pub title: String,
    pub status: ReportStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub resolved: usize,
    pub pending: usize,
    pub by_category: BTreeMap<String, usize>,
    pub recent: Vec<ActivityItem>,
}

impl DashboardStats {
    pub fn compute(reports: &[Report]) -> Self {
        let mut by_category = BTreeMap::new();
        for report in reports {
            *by_category
                .entry(report.category().as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut newest = reports.to_vec();
        sort_newest_first(&mut newest);
        let recent = newest
            .into_iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|report| ActivityItem {
                id: report.id.clone(),
                title: report.title().to_string(),
                status: report.status(),
                submitted_at: report.submitted_at(),
            })
            .collect();

        Self {
            total: reports.len(),
            resolved: reports
                .iter()
                .filter(|report| report.status().is_terminal())
                .count(),
            pending: reports.iter().filter(|report| report.is_pending()).count(),
            by_category,
            recent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use civic_core_types::{Category, Priority, ReportDetails};

    fn report(category: Category, secs: i64) -> Report {
        Report::submitted(
            ReportId::new(),
            ReportDetails {
                title: format!("Report at {secs}"),
                category,
                priority: Priority::Medium,
                location: String::new(),
                description: "Long enough description text".into(),
                is_public: true,
                is_anonymous: false,
            },
            "anonymous",
            Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        )
    }

    #[test]
    fn counts_totals_and_categories() {
        let mut resolved = report(Category::Environment, 0);
        let at = resolved.submitted_at();
        resolved
            .record_transition(ReportStatus::UnderReview, at, "r")
            .unwrap();
        resolved
            .record_transition(ReportStatus::InProgress, at, "p")
            .unwrap();
        resolved
            .record_transition(ReportStatus::Resolved, at, "done")
            .unwrap();
        let reports = vec![
            resolved,
            report(Category::Environment, 1),
            report(Category::Infrastructure, 2),
        ];

        let stats = DashboardStats::compute(&reports);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.by_category.get("environment"), Some(&2));
        assert_eq!(stats.by_category.get("infrastructure"), Some(&1));
    }

    #[test]
    fn recent_activity_is_capped_and_newest_first() {
        let reports: Vec<Report> = (0..7).map(|i| report(Category::Other, i)).collect();
        let stats = DashboardStats::compute(&reports);
        assert_eq!(stats.recent.len(), RECENT_ACTIVITY_LIMIT);
        assert_eq!(stats.recent[0].title, "Report at 6");
    }
}
