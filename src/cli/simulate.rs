use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info};

use civic_lifecycle::{metrics, AdvanceScheduler, LifecycleEvent, ScheduleSummary};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct SimulateArgs {
    /// How many passes over the pending backlog to run
    #[arg(long, default_value_t = 1)]
    pub rounds: usize,

    /// Gap between consecutive reports in a pass (e.g. 250ms, 10s)
    #[arg(long)]
    pub stagger: Option<humantime::Duration>,

    /// Extra wait before the first report in a pass
    #[arg(long)]
    pub initial_delay: Option<humantime::Duration>,
}

#[derive(Serialize)]
struct RoundView {
    round: usize,
    scheduled: usize,
    summary: ScheduleSummary,
    events: Vec<LifecycleEvent>,
}

pub async fn cmd_simulate(args: SimulateArgs, ctx: &CliContext) -> Result<()> {
    let mut policy = ctx.config().simulation.advance_policy();
    if let Some(stagger) = args.stagger {
        policy.stagger = stagger.into();
    }
    if let Some(delay) = args.initial_delay {
        policy.initial_delay = delay.into();
    }

    let engine = ctx.engine().clone();
    let mut rounds = Vec::with_capacity(args.rounds);
    for round in 1..=args.rounds {
        let mut events = engine.events().subscribe();
        let scheduler = AdvanceScheduler::spawn(engine.clone());
        let scheduled = scheduler
            .schedule_pending(&policy)
            .context("Failed to schedule pending reports")?
            .len();
        info!(round, scheduled, stagger = ?policy.stagger, "simulation round started");
        if scheduled == 0 {
            let _ = scheduler.shutdown().await;
            rounds.push(RoundView {
                round,
                scheduled,
                summary: ScheduleSummary::default(),
                events: Vec::new(),
            });
            break;
        }
        let summary = scheduler.drain().await;

        let mut seen = Vec::new();
        loop {
            match events.try_recv() {
                Ok(event) => seen.push(event),
                Err(TryRecvError::Lagged(missed)) => {
                    debug!(missed, "event subscriber lagged");
                }
                Err(_) => break,
            }
        }
        rounds.push(RoundView {
            round,
            scheduled,
            summary,
            events: seen,
        });
    }
    debug!(counters = ?metrics::snapshot(), "simulation finished");

    ctx.output().emit(&rounds, |rounds| {
        if rounds.iter().all(|round| round.scheduled == 0) {
            println!("No pending reports to advance.");
            return;
        }
        for round in rounds.iter().filter(|round| round.scheduled > 0) {
            println!(
                "Round {}: advanced={} skipped={} failed={}",
                round.round, round.summary.advanced, round.summary.skipped, round.summary.failed
            );
            for event in &round.events {
                if !matches!(event, LifecycleEvent::Submitted { .. }) {
                    println!("  {}", event.headline());
                }
            }
        }
    })
}
