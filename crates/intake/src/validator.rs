use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use civic_core_types::{Category, Priority, ReportDetails, ReportFields};

use crate::sanitize::{SanitizePolicy, ScriptTagPolicy};

/// Field-level validation failure; every message is meant for the citizen.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{}", .errors.join(", "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub min_title_len: usize,
    pub min_description_len: usize,
    /// Reject categories outside the known set instead of routing them to
    /// general administration.
    pub enforce_known_category: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_title_len: 5,
            min_description_len: 20,
            enforce_known_category: false,
        }
    }
}

/// Citizen registration form.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone)]
pub struct Validator {
    rules: ValidationRules,
    policy: Arc<dyn SanitizePolicy>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationRules::default())
    }
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Self {
        Self::with_policy(rules, Arc::new(ScriptTagPolicy))
    }

    pub fn with_policy(rules: ValidationRules, policy: Arc<dyn SanitizePolicy>) -> Self {
        Self { rules, policy }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Applies the sanitization policy to every free-text field without
    /// judging the result. Used for drafts.
    pub fn sanitize_fields(&self, fields: &ReportFields) -> ReportFields {
        ReportFields {
            title: self.policy.clean(&fields.title),
            category: fields.category.trim().to_string(),
            priority: fields.priority.trim().to_string(),
            location: self.policy.clean(&fields.location),
            description: self.policy.clean(&fields.description),
            is_public: fields.is_public,
            is_anonymous: fields.is_anonymous,
        }
    }

    /// Sanitizes and checks a submission. Lengths are measured on the
    /// sanitized text, so stripped markup cannot pad a short title.
    pub fn validate(&self, fields: &ReportFields) -> Result<ReportDetails, ValidationError> {
        let clean = self.sanitize_fields(fields);
        let mut errors = Vec::new();

        if clean.title.chars().count() < self.rules.min_title_len {
            errors.push(format!(
                "Title must be at least {} characters long",
                self.rules.min_title_len
            ));
        }

        let category = Category::parse(&clean.category);
        if clean.category.is_empty() {
            errors.push("Please select a category".to_string());
        } else if self.rules.enforce_known_category && !category.is_known() {
            errors.push(format!("Unknown category `{}`", clean.category));
        }

        if clean.description.chars().count() < self.rules.min_description_len {
            errors.push(format!(
                "Description must be at least {} characters long",
                self.rules.min_description_len
            ));
        }

        let priority = if clean.priority.is_empty() {
            Some(Priority::default())
        } else {
            Priority::parse(&clean.priority)
        };
        if priority.is_none() {
            errors.push("Priority must be one of low, medium, high".to_string());
        }

        match priority {
            Some(priority) if errors.is_empty() => Ok(ReportDetails {
                title: clean.title,
                category,
                priority,
                location: clean.location,
                description: clean.description,
                is_public: clean.is_public,
                is_anonymous: clean.is_anonymous,
            }),
            _ => {
                debug!(
                    policy = self.policy.name(),
                    error_count = errors.len(),
                    "report rejected by validator"
                );
                Err(ValidationError { errors })
            }
        }
    }

    pub fn validate_registration(
        &self,
        registration: &Registration,
    ) -> Result<Registration, ValidationError> {
        let clean_optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(|raw| self.policy.clean(raw))
                .filter(|cleaned| !cleaned.is_empty())
        };
        let clean = Registration {
            name: self.policy.clean(&registration.name),
            email: self.policy.clean(&registration.email),
            phone: clean_optional(&registration.phone),
            location: clean_optional(&registration.location),
        };
        if clean.name.is_empty() || clean.email.is_empty() {
            return Err(ValidationError::single("Name and email are required."));
        }
        Ok(clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str, category: &str, description: &str) -> ReportFields {
        ReportFields {
            title: title.into(),
            category: category.into(),
            description: description.into(),
            ..ReportFields::default()
        }
    }

    const DESCRIPTION: &str = "A large pothole has formed near the school crossing.";

    #[test]
    fn accepts_valid_submission() {
        let details = Validator::default()
            .validate(&fields("Pothole on Oak St", "infrastructure", DESCRIPTION))
            .unwrap();
        assert_eq!(details.category, Category::Infrastructure);
        assert_eq!(details.priority, Priority::Medium);
    }

    #[test]
    fn title_boundary_is_five_characters() {
        let validator = Validator::default();
        let err = validator
            .validate(&fields("  abcd  ", "other", DESCRIPTION))
            .unwrap_err();
        assert_eq!(err.errors, vec!["Title must be at least 5 characters long"]);
        assert!(validator
            .validate(&fields("  abcde  ", "other", DESCRIPTION))
            .is_ok());
    }

    #[test]
    fn description_boundary_is_twenty_characters() {
        let validator = Validator::default();
        let nineteen = "a".repeat(19);
        let twenty = "a".repeat(20);
        let err = validator
            .validate(&fields("Valid title", "other", &nineteen))
            .unwrap_err();
        assert_eq!(
            err.errors,
            vec!["Description must be at least 20 characters long"]
        );
        assert!(validator
            .validate(&fields("Valid title", "other", &twenty))
            .is_ok());
    }

    #[test]
    fn collects_every_failure() {
        let err = Validator::default()
            .validate(&fields("", "", "short"))
            .unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert_eq!(
            err.to_string(),
            "Title must be at least 5 characters long, Please select a category, \
             Description must be at least 20 characters long"
        );
    }

    #[test]
    fn unknown_category_passes_unless_enforced() {
        let input = fields("Valid title", "potholes", DESCRIPTION);
        let details = Validator::default().validate(&input).unwrap();
        assert_eq!(details.category, Category::Unrecognized("potholes".into()));

        let strict = Validator::new(ValidationRules {
            enforce_known_category: true,
            ..ValidationRules::default()
        });
        let err = strict.validate(&input).unwrap_err();
        assert_eq!(err.errors, vec!["Unknown category `potholes`"]);
    }

    #[test]
    fn script_only_title_is_rejected_after_sanitizing() {
        let err = Validator::default()
            .validate(&fields("<script>alert('hi')</script>", "other", DESCRIPTION))
            .unwrap_err();
        assert_eq!(err.errors, vec!["Title must be at least 5 characters long"]);
    }

    #[test]
    fn sanitizes_location() {
        let mut input = fields("Valid title", "environment", DESCRIPTION);
        input.location = " Park <script>x()</script>".into();
        let details = Validator::default().validate(&input).unwrap();
        assert_eq!(details.location, "Park");
    }

    #[test]
    fn rejects_unknown_priority() {
        let mut input = fields("Valid title", "other", DESCRIPTION);
        input.priority = "urgent".into();
        let err = Validator::default().validate(&input).unwrap_err();
        assert_eq!(err.errors, vec!["Priority must be one of low, medium, high"]);
    }

    #[test]
    fn registration_requires_name_and_email() {
        let validator = Validator::default();
        let err = validator
            .validate_registration(&Registration {
                name: "Ada".into(),
                ..Registration::default()
            })
            .unwrap_err();
        assert_eq!(err.errors, vec!["Name and email are required."]);

        let ok = validator
            .validate_registration(&Registration {
                name: " Ada ".into(),
                email: "ada@example.org".into(),
                phone: Some("   ".into()),
                location: None,
            })
            .unwrap();
        assert_eq!(ok.name, "Ada");
        assert_eq!(ok.phone, None);
    }
}
