//! Fetch executor.
//!
//! Runs every target to a terminal state with the strategy chosen in
//! `ExecutorConfig`, then builds the `RunReport`. The per-unit algorithm
//! (time, fetch, write, record) lives in `unit` and is the same for every
//! strategy; the strategy only decides how units are multiplexed:
//!
//! - parallel-worker: OS threads, fan-in over an mpsc channel (`pool`)
//! - isolated-process: one child process per unit, supervised from the pool (`process`)
//! - cooperative-concurrent: a single curl multi loop on the calling thread (`cooperative`)

mod context;
mod cooperative;
mod pool;
mod process;
mod unit;

use std::time::Instant;

use crate::report::{FetchResult, RunReport};
use crate::strategy::{ExecutorConfig, Strategy};
use crate::targets::FetchTarget;

pub use context::RunContext;
pub use unit::run_unit;

/// Results tagged with the index of their target.
type Indexed = Vec<(usize, FetchResult)>;

/// Runs all targets and returns the report. Never fails as a whole: per-unit
/// failures are recorded in the results. `ctx` is consumed and dropped when
/// the run ends.
pub fn run(targets: &[FetchTarget], config: &ExecutorConfig, ctx: RunContext) -> RunReport {
    let in_flight = config.in_flight_for(targets.len());
    tracing::info!(
        strategy = %config.strategy,
        targets = targets.len(),
        in_flight,
        dir = %ctx.sink().dir().display(),
        "run started"
    );

    let started = Instant::now();
    let mut indexed = if targets.is_empty() {
        Vec::new()
    } else {
        match config.strategy {
            Strategy::ParallelWorker => pool::run_pool(targets, in_flight, &ctx, |t| run_unit(t, &ctx)),
            Strategy::IsolatedProcess => process::dispatch(targets, in_flight, &config.worker, &ctx),
            Strategy::CooperativeConcurrent => cooperative::dispatch(targets, in_flight, &ctx),
        }
    };
    let total_duration = started.elapsed();

    indexed.sort_by_key(|(i, _)| *i);
    debug_assert!(indexed.iter().map(|(i, _)| *i).eq(0..targets.len()));
    let report = RunReport {
        strategy: config.strategy,
        results: indexed.into_iter().map(|(_, r)| r).collect(),
        total_duration,
    };
    tracing::info!(
        strategy = %config.strategy,
        succeeded = report.succeeded(),
        failed = report.failed(),
        bytes = report.total_bytes(),
        total_ms = total_duration.as_millis() as u64,
        "run finished"
    );
    report
}
