//! Shared primitives for the CivicConnect report lifecycle: identifiers,
//! status/category enums, the report data model and the injectable clock.

pub mod clock;
pub mod ids;
pub mod model;
pub mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{DraftId, ReportId, UserId};
pub use model::{
    Draft, Report, ReportDetails, ReportFields, Settings, TimelineEntry, TimelineError, User,
    ANONYMOUS_SUBMITTER, OFFLINE_SUBMITTER,
};
pub use status::{Category, Priority, ReportStatus};
