use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use civic_core_types::{DraftId, ReportId, ReportStatus};

/// Notifications raised by the engine for whoever renders them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Submitted {
        report_id: ReportId,
        authority: String,
        at: DateTime<Utc>,
    },
    Advanced {
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
        at: DateTime<Utc>,
    },
    Resolved {
        report_id: ReportId,
        title: String,
        at: DateTime<Utc>,
    },
    DraftSaved {
        draft_id: DraftId,
        at: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    pub fn report_id(&self) -> Option<&ReportId> {
        match self {
            LifecycleEvent::Submitted { report_id, .. }
            | LifecycleEvent::Advanced { report_id, .. }
            | LifecycleEvent::Resolved { report_id, .. } => Some(report_id),
            LifecycleEvent::DraftSaved { .. } => None,
        }
    }

    /// One-line text for a notification toast or terminal.
    pub fn headline(&self) -> String {
        match self {
            LifecycleEvent::Submitted {
                report_id,
                authority,
                ..
            } => format!(
                "Report {} submitted and routed to {authority}",
                report_id.short()
            ),
            LifecycleEvent::Advanced { report_id, to, .. } => {
                format!("Report {} is now {}", report_id.short(), to.label())
            }
            LifecycleEvent::Resolved { title, .. } => {
                format!("Your report \"{title}\" has been resolved.")
            }
            LifecycleEvent::DraftSaved { .. } => {
                "Your report has been saved as a draft.".to_string()
            }
        }
    }
}

/// Broadcast bus for lifecycle events. Publishing without subscribers is
/// fine; slow subscribers lag and miss the oldest events.
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: LifecycleEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(Self::DEFAULT_CAPACITY);
        Self { sender }
    }
}
