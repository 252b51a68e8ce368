//! Report lifecycle for CivicConnect: submission, routing, the fixed
//! advance sequence, drafts, account state and the deferred advance
//! scheduler that simulates authorities working through the backlog.

pub mod demo;
pub mod engine;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod scheduler;

pub use demo::{demo_reports, DEMO_SUBMITTER};
pub use engine::{transition_description, AdvanceOutcome, LifecycleEngine};
pub use errors::{LifecycleError, LifecycleResult};
pub use events::{EventBus, LifecycleEvent};
pub use scheduler::{AdvancePolicy, AdvanceScheduler, AdvanceTicket, ScheduleSummary};
