pub mod backend;
pub mod errors;
pub mod query;
pub mod repository;
pub mod snapshot;
pub mod stats;

pub use backend::{FileBackend, MemoryBackend, SnapshotBackend};
pub use errors::{StoreError, StoreResult};
pub use query::ReportFilter;
pub use repository::{Repository, RestoreOutcome, SharedRepository};
pub use snapshot::Snapshot;
pub use stats::{ActivityItem, DashboardStats};
