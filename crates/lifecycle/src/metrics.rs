use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    drafts_saved: AtomicU64,
    advanced: AtomicU64,
    resolved: AtomicU64,
    skipped: AtomicU64,
    cancelled: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn record_submitted() {
    increment(&COUNTERS.submitted);
}

pub fn record_draft_saved() {
    increment(&COUNTERS.drafts_saved);
}

pub fn record_advanced() {
    increment(&COUNTERS.advanced);
}

pub fn record_resolved() {
    increment(&COUNTERS.resolved);
}

pub fn record_skipped() {
    increment(&COUNTERS.skipped);
}

pub fn record_cancelled(count: u64) {
    COUNTERS.cancelled.fetch_add(count, Ordering::Relaxed);
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LifecycleMetricsSnapshot {
    pub submitted: u64,
    pub drafts_saved: u64,
    pub advanced: u64,
    pub resolved: u64,
    pub skipped: u64,
    pub cancelled: u64,
}

pub fn snapshot() -> LifecycleMetricsSnapshot {
    LifecycleMetricsSnapshot {
        submitted: COUNTERS.submitted.load(Ordering::Relaxed),
        drafts_saved: COUNTERS.drafts_saved.load(Ordering::Relaxed),
        advanced: COUNTERS.advanced.load(Ordering::Relaxed),
        resolved: COUNTERS.resolved.load(Ordering::Relaxed),
        skipped: COUNTERS.skipped.load(Ordering::Relaxed),
        cancelled: COUNTERS.cancelled.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        record_advanced();
        record_cancelled(2);
        let after = snapshot();
        assert!(after.advanced > before.advanced);
        assert!(after.cancelled >= before.cancelled + 2);
    }
}
