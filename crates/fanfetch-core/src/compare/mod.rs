//! Strategy comparison: run the same targets once per strategy and report
//! wall time, throughput and failures side by side.
//!
//! Each run writes into its own temporary directory so runs never see each
//! other's files and nothing is left behind in the caller's output dir.

use anyhow::{Context, Result};

use crate::executor::{self, RunContext};
use crate::fetch::FetchOptions;
use crate::report::RunReport;
use crate::retry::RetryPolicy;
use crate::sink::Sink;
use crate::strategy::{ExecutorConfig, Strategy};
use crate::targets::FetchTarget;

/// Outcome of one strategy over the full target list.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareResult {
    pub strategy: Strategy,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes: u64,
    pub elapsed_secs: f64,
    pub throughput_mib_s: f64,
    /// Slowest single unit; the lower bound for any concurrent strategy.
    pub max_unit_secs: f64,
}

impl CompareResult {
    pub fn from_report(report: &RunReport) -> Self {
        let elapsed_secs = report.total_duration.as_secs_f64();
        let bytes = report.total_bytes();
        let throughput_mib_s = if elapsed_secs > 0.0 && bytes > 0 {
            (bytes as f64 / 1_048_576.0) / elapsed_secs
        } else {
            0.0
        };
        Self {
            strategy: report.strategy,
            succeeded: report.succeeded(),
            failed: report.failed(),
            bytes,
            elapsed_secs,
            throughput_mib_s,
            max_unit_secs: report.max_unit_duration().as_secs_f64(),
        }
    }
}

/// Runs `targets` once with every strategy in [`Strategy::ALL`] order.
/// `base` supplies `max_in_flight` and the worker program; its strategy is
/// ignored. Blocks the calling thread (use `spawn_blocking` from async).
pub fn run_comparison(
    targets: &[FetchTarget],
    base: &ExecutorConfig,
    fetch: &FetchOptions,
    retry: Option<RetryPolicy>,
) -> Result<Vec<CompareResult>> {
    let mut results = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let temp_dir = tempfile::tempdir()
            .with_context(|| format!("create temp dir for {strategy} run"))?;
        let config = ExecutorConfig {
            strategy,
            ..base.clone()
        };
        let ctx = RunContext::new(Sink::new(temp_dir.path()))
            .with_fetch_options(fetch.clone())
            .with_retry(retry);
        let report = executor::run(targets, &config, ctx);
        let row = CompareResult::from_report(&report);
        tracing::info!(
            strategy = %strategy,
            secs = row.elapsed_secs,
            failed = row.failed,
            "comparison run finished"
        );
        results.push(row);
    }
    Ok(results)
}

/// Fastest strategy among runs with no failures; if every run had failures,
/// the fastest overall.
pub fn recommend_strategy(results: &[CompareResult]) -> Option<Strategy> {
    fastest(results.iter().filter(|r| r.failed == 0)).or_else(|| fastest(results.iter()))
}

fn fastest<'a>(rows: impl Iterator<Item = &'a CompareResult>) -> Option<Strategy> {
    rows.min_by(|a, b| {
        a.elapsed_secs
            .partial_cmp(&b.elapsed_secs)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
    .map(|r| r.strategy)
}
