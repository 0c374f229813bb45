//! `fanfetch bench` – run every strategy on the same targets and compare.

use anyhow::{Context, Result};
use fanfetch_core::compare::{self, CompareResult};
use fanfetch_core::config::FanfetchConfig;
use fanfetch_core::resolve_targets;

use super::{executor_config, explicit_links, retry_policy};

fn print_compare_results(results: &[CompareResult]) {
    println!(
        "  {:<22}  {:>4}  {:>6}  {:>10}  {:>8}  {:>8}  {:>8}",
        "Strategy", "OK", "Failed", "Bytes", "Time(s)", "Slowest", "MiB/s"
    );
    println!(
        "  {}  {}  {}  {}  {}  {}  {}",
        "----------------------", "----", "------", "----------", "--------", "--------", "--------"
    );
    for r in results {
        println!(
            "  {:<22}  {:>4}  {:>6}  {:>10}  {:>8.3}  {:>8.3}  {:>8.2}",
            r.strategy.name(),
            r.succeeded,
            r.failed,
            r.bytes,
            r.elapsed_secs,
            r.max_unit_secs,
            r.throughput_mib_s
        );
    }
}

pub async fn run_bench(links: &[String], jobs: Option<usize>, cfg: &FanfetchConfig) -> Result<()> {
    let targets = resolve_targets(explicit_links(links), &cfg.target_source())?;
    let base = executor_config(None, jobs, cfg)?;
    let fetch = cfg.fetch_options();
    let retry = retry_policy(cfg);
    let results = tokio::task::spawn_blocking(move || {
        compare::run_comparison(&targets, &base, &fetch, retry)
    })
    .await
    .context("bench task join")??;
    print_compare_results(&results);
    if let Some(rec) = compare::recommend_strategy(&results) {
        println!("Recommended strategy: {}", rec);
    }
    Ok(())
}
