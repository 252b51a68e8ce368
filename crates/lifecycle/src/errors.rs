use thiserror::Error;

use civic_core_types::{DraftId, ReportId, TimelineError};
use civic_intake::ValidationError;
use civic_report_store::StoreError;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("report not found: {0}")]
    NotFound(ReportId),
    #[error("draft not found: {0}")]
    DraftNotFound(DraftId),
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TimelineError),
    #[error("storage failure: {0}")]
    Store(StoreError),
    #[error("advance scheduler is shut down")]
    SchedulerClosed,
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => LifecycleError::NotFound(ReportId(id)),
            StoreError::DraftNotFound(id) => LifecycleError::DraftNotFound(DraftId(id)),
            other => LifecycleError::Store(other),
        }
    }
}

impl LifecycleError {
    /// Messages suitable for showing to the citizen who filled the form.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            LifecycleError::Validation(err) => err.errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
