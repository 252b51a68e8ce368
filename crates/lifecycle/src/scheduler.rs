use std::collections::HashMap;
use std::fmt;
use std::future::poll_fn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::{debug, warn};

use civic_core_types::ReportId;

use crate::engine::{AdvanceOutcome, LifecycleEngine};
use crate::errors::{LifecycleError, LifecycleResult};
use crate::metrics;

/// Delay policy for advancing the pending backlog.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AdvancePolicy {
    pub stagger: Duration,
    pub initial_delay: Duration,
}

impl Default for AdvancePolicy {
    fn default() -> Self {
        Self {
            stagger: Duration::from_secs(10),
            initial_delay: Duration::ZERO,
        }
    }
}

impl AdvancePolicy {
    /// Delay for the `index`-th pending report (0-based).
    pub fn delay_for(&self, index: usize) -> Duration {
        let slots = u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_add(self.stagger.saturating_mul(slots))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct AdvanceTicket(u64);

impl fmt::Display for AdvanceTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "advance-{}", self.0)
    }
}

/// What the worker did before it stopped.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub advanced: usize,
    /// Fired for a report that was gone or already resolved.
    pub skipped: usize,
    pub cancelled: usize,
    pub failed: usize,
}

enum Command {
    Schedule {
        ticket: AdvanceTicket,
        report_id: ReportId,
        delay: Duration,
    },
    Cancel {
        ticket: AdvanceTicket,
        reply: oneshot::Sender<bool>,
    },
    Drain,
}

/// Deferred advance requests, executed one at a time by a single worker
/// task. Dropping the scheduler cancels whatever is still queued.
pub struct AdvanceScheduler {
    engine: Arc<LifecycleEngine>,
    tx: mpsc::UnboundedSender<Command>,
    next_ticket: AtomicU64,
    shutdown: CancellationToken,
    worker: Option<JoinHandle<ScheduleSummary>>,
}

impl AdvanceScheduler {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(engine: Arc<LifecycleEngine>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(run_worker(engine.clone(), rx, shutdown.clone()));
        Self {
            engine,
            tx,
            next_ticket: AtomicU64::new(1),
            shutdown,
            worker: Some(worker),
        }
    }

    /// Requests one `advance` of `report_id` after `delay`.
    pub fn schedule(&self, report_id: ReportId, delay: Duration) -> LifecycleResult<AdvanceTicket> {
        let ticket = AdvanceTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        debug!(%ticket, report_id = %report_id, delay_ms = delay.as_millis() as u64, "advance scheduled");
        self.tx
            .send(Command::Schedule {
                ticket,
                report_id,
                delay,
            })
            .map_err(|_| LifecycleError::SchedulerClosed)?;
        Ok(ticket)
    }

    /// Schedules exactly one advance for every pending report, staggered by
    /// its position among pending reports.
    pub fn schedule_pending(&self, policy: &AdvancePolicy) -> LifecycleResult<Vec<AdvanceTicket>> {
        self.engine
            .repository()
            .pending_ids()
            .into_iter()
            .enumerate()
            .map(|(index, id)| self.schedule(id, policy.delay_for(index)))
            .collect()
    }

    /// Withdraws a request that has not fired yet.
    pub async fn cancel(&self, ticket: AdvanceTicket) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Cancel { ticket, reply }).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Waits until every queued request has fired, then stops the worker.
    pub async fn drain(mut self) -> ScheduleSummary {
        if self.tx.send(Command::Drain).is_err() {
            debug!("advance worker already stopped");
        }
        self.join().await
    }

    /// Stops the worker now; queued requests are cancelled.
    pub async fn shutdown(mut self) -> ScheduleSummary {
        self.shutdown.cancel();
        self.join().await
    }

    async fn join(&mut self) -> ScheduleSummary {
        let Some(worker) = self.worker.take() else {
            return ScheduleSummary::default();
        };
        match worker.await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(error = %err, "advance worker terminated abnormally");
                ScheduleSummary::default()
            }
        }
    }
}

impl Drop for AdvanceScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_worker(
    engine: Arc<LifecycleEngine>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    shutdown: CancellationToken,
) -> ScheduleSummary {
    let mut queue: DelayQueue<(AdvanceTicket, ReportId)> = DelayQueue::new();
    let mut keys: HashMap<AdvanceTicket, delay_queue::Key> = HashMap::new();
    let mut summary = ScheduleSummary::default();
    let mut open = true;
    let mut draining = false;

    loop {
        if draining && queue.is_empty() {
            break;
        }
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                summary.cancelled += queue.len();
                metrics::record_cancelled(queue.len() as u64);
                break;
            }
            command = rx.recv(), if open => match command {
                Some(Command::Schedule { ticket, report_id, delay }) => {
                    let key = queue.insert((ticket, report_id), delay);
                    keys.insert(ticket, key);
                }
                Some(Command::Cancel { ticket, reply }) => {
                    let removed = match keys.remove(&ticket) {
                        Some(key) => {
                            queue.remove(&key);
                            summary.cancelled += 1;
                            metrics::record_cancelled(1);
                            true
                        }
                        None => false,
                    };
                    let _ = reply.send(removed);
                }
                Some(Command::Drain) => draining = true,
                None => {
                    open = false;
                    draining = true;
                }
            },
            expired = poll_fn(|cx| queue.poll_expired(cx)), if !queue.is_empty() => {
                let Some(expired) = expired else { continue };
                let (ticket, report_id) = expired.into_inner();
                keys.remove(&ticket);
                match engine.advance(&report_id) {
                    Ok(AdvanceOutcome::Advanced { .. }) => summary.advanced += 1,
                    Ok(AdvanceOutcome::AlreadyResolved) => {
                        summary.skipped += 1;
                        metrics::record_skipped();
                    }
                    Err(LifecycleError::NotFound(_)) => {
                        debug!(%ticket, report_id = %report_id, "scheduled advance skipped; report gone");
                        summary.skipped += 1;
                        metrics::record_skipped();
                    }
                    Err(err) => {
                        warn!(%ticket, report_id = %report_id, error = %err, "scheduled advance failed");
                        summary.failed += 1;
                    }
                }
            }
        }
    }

    debug!(
        advanced = summary.advanced,
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        failed = summary.failed,
        "advance worker stopped"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core_types::ReportStatus;

    #[test]
    fn delays_are_staggered_by_position() {
        let policy = AdvancePolicy {
            stagger: Duration::from_secs(10),
            initial_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(15));
        assert_eq!(policy.delay_for(2), Duration::from_secs(35));
        assert_eq!(AdvancePolicy::default().delay_for(0), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_never_fires() {
        let engine = Arc::new(LifecycleEngine::ephemeral());
        engine.seed_demo().unwrap();
        let scheduler = AdvanceScheduler::spawn(engine.clone());
        let tickets = scheduler.schedule_pending(&AdvancePolicy::default()).unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(scheduler.cancel(tickets[0]).await);
        assert!(!scheduler.cancel(tickets[0]).await);

        let summary = scheduler.drain().await;
        assert_eq!(summary.advanced, 0);
        assert_eq!(summary.cancelled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_queued_work() {
        let engine = Arc::new(LifecycleEngine::ephemeral());
        engine.seed_demo().unwrap();
        let scheduler = AdvanceScheduler::spawn(engine.clone());
        let id = engine.repository().pending_ids().remove(0);
        scheduler.schedule(id.clone(), Duration::from_secs(60)).unwrap();
        scheduler.schedule(id.clone(), Duration::from_secs(120)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let summary = scheduler.shutdown().await;
        assert_eq!(summary.cancelled, 2);
        assert_eq!(summary.advanced, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_report_turns_advance_into_noop() {
        let engine = Arc::new(LifecycleEngine::ephemeral());
        engine.seed_demo().unwrap();
        let id = engine.repository().pending_ids().remove(0);
        let scheduler = AdvanceScheduler::spawn(engine.clone());
        scheduler.schedule(id.clone(), Duration::from_secs(1)).unwrap();
        engine.remove(&id).unwrap();

        let summary = scheduler.drain().await;
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.advanced, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn report_resolved_before_firing_is_skipped() {
        let engine = Arc::new(LifecycleEngine::ephemeral());
        engine.seed_demo().unwrap();
        let id = engine.repository().pending_ids().remove(0);
        let scheduler = AdvanceScheduler::spawn(engine.clone());
        scheduler.schedule(id.clone(), Duration::from_secs(5)).unwrap();

        while engine.repository().find(&id).unwrap().is_pending() {
            engine.advance(&id).unwrap();
        }
        let before = engine.repository().find(&id).unwrap();
        assert_eq!(before.status(), ReportStatus::Resolved);

        let summary = scheduler.drain().await;
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.advanced, 0);
        let after = engine.repository().find(&id).unwrap();
        assert_eq!(after.timeline(), before.timeline());
    }
}
