use civic_core_types::{Category, Report, ReportStatus};

/// Search/filter criteria from the tracking view. Empty criteria match
/// everything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReportFilter {
    /// Case-insensitive substring of the title or the id.
    pub text: Option<String>,
    pub status: Option<ReportStatus>,
    pub category: Option<Category>,
}

impl ReportFilter {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn status(mut self, status: ReportStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, report: &Report) -> bool {
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let in_title = report.title().to_lowercase().contains(&needle);
            let in_id = report.id.0.to_lowercase().contains(&needle);
            if !in_title && !in_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if report.status() != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if report.category() != category {
                return false;
            }
        }
        true
    }
}

/// Newest submission first.
pub fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at()));
}
