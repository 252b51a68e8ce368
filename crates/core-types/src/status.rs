use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle states of a report.
///
/// `Routed` is recorded in the timeline when an authority is assigned but
/// never becomes the visible `status` of a report.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Submitted,
    Routed,
    UnderReview,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub const PENDING: [ReportStatus; 3] = [
        ReportStatus::Submitted,
        ReportStatus::UnderReview,
        ReportStatus::InProgress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Submitted => "submitted",
            ReportStatus::Routed => "routed",
            ReportStatus::UnderReview => "under-review",
            ReportStatus::InProgress => "in-progress",
            ReportStatus::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitted" => Some(ReportStatus::Submitted),
            "routed" => Some(ReportStatus::Routed),
            "under-review" => Some(ReportStatus::UnderReview),
            "in-progress" => Some(ReportStatus::InProgress),
            "resolved" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }

    /// Title-cased label, e.g. `Under Review`.
    pub fn label(self) -> String {
        title_case(self.as_str())
    }

    /// Next state in the fixed advance sequence, `None` once resolved.
    pub fn next(self) -> Option<Self> {
        match self {
            ReportStatus::Submitted | ReportStatus::Routed => Some(ReportStatus::UnderReview),
            ReportStatus::UnderReview => Some(ReportStatus::InProgress),
            ReportStatus::InProgress => Some(ReportStatus::Resolved),
            ReportStatus::Resolved => None,
        }
    }

    pub fn is_pending(self) -> bool {
        Self::PENDING.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        self == ReportStatus::Resolved
    }

    /// Whether a timeline entry with status `self` may directly follow one
    /// with status `prev`.
    pub fn may_follow(self, prev: ReportStatus) -> bool {
        match prev {
            ReportStatus::Submitted => {
                matches!(self, ReportStatus::Routed | ReportStatus::UnderReview)
            }
            other => other.next() == Some(self),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue category chosen by the citizen.
///
/// Unknown strings are kept verbatim in `Unrecognized` so they survive a
/// snapshot round trip; routing sends them to general administration.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Infrastructure,
    PublicSafety,
    Environment,
    Transportation,
    PublicServices,
    Corruption,
    Accessibility,
    Other,
    Unrecognized(String),
}

impl Category {
    pub const KNOWN: [Category; 8] = [
        Category::Infrastructure,
        Category::PublicSafety,
        Category::Environment,
        Category::Transportation,
        Category::PublicServices,
        Category::Corruption,
        Category::Accessibility,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Infrastructure => "infrastructure",
            Category::PublicSafety => "public-safety",
            Category::Environment => "environment",
            Category::Transportation => "transportation",
            Category::PublicServices => "public-services",
            Category::Corruption => "corruption",
            Category::Accessibility => "accessibility",
            Category::Other => "other",
            Category::Unrecognized(raw) => raw,
        }
    }

    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == trimmed)
            .cloned()
            .unwrap_or_else(|| Category::Unrecognized(trimmed.to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unrecognized(_))
    }

    pub fn label(&self) -> String {
        title_case(self.as_str())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn label(self) -> String {
        title_case(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn title_case(value: &str) -> String {
    value
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_sequence_is_fixed() {
        assert_eq!(ReportStatus::Submitted.next(), Some(ReportStatus::UnderReview));
        assert_eq!(ReportStatus::UnderReview.next(), Some(ReportStatus::InProgress));
        assert_eq!(ReportStatus::InProgress.next(), Some(ReportStatus::Resolved));
        assert_eq!(ReportStatus::Resolved.next(), None);
    }

    #[test]
    fn routed_only_follows_submitted() {
        assert!(ReportStatus::Routed.may_follow(ReportStatus::Submitted));
        assert!(ReportStatus::UnderReview.may_follow(ReportStatus::Routed));
        assert!(!ReportStatus::Routed.may_follow(ReportStatus::UnderReview));
        assert!(!ReportStatus::Resolved.may_follow(ReportStatus::Submitted));
        assert!(!ReportStatus::Submitted.may_follow(ReportStatus::Resolved));
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(ReportStatus::UnderReview.label(), "Under Review");
        assert_eq!(Category::PublicSafety.label(), "Public Safety");
        assert_eq!(Priority::High.label(), "High");
    }

    #[test]
    fn unknown_category_is_kept_verbatim() {
        let category = Category::parse("potholes");
        assert_eq!(category, Category::Unrecognized("potholes".into()));
        assert!(!category.is_known());
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"potholes\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, category);
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&ReportStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(ReportStatus::parse("Under-Review"), Some(ReportStatus::UnderReview));
    }

    #[test]
    fn priority_is_ordered() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::parse("bogus"), None);
    }
}
