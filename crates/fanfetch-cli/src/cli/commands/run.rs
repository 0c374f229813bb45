//! `fanfetch run` – fetch the targets with one strategy.

use anyhow::{Context, Result};
use fanfetch_core::config::FanfetchConfig;
use fanfetch_core::report::{FetchResult, Outcome, RunReport};
use fanfetch_core::sink::Sink;
use fanfetch_core::{executor, resolve_targets, RunContext};
use std::path::PathBuf;

use super::{executor_config, explicit_links, retry_policy};
use crate::cli::RunArgs;

/// `name: 0.412s`, or `name: failed after 0.412s (reason)`.
pub(crate) fn unit_line(result: &FetchResult) -> String {
    let secs = result.duration.as_secs_f64();
    match &result.outcome {
        Outcome::Success => format!("{}: {:.3}s", result.destination_name, secs),
        Outcome::Failure { reason, .. } => {
            format!("{}: failed after {:.3}s ({})", result.destination_name, secs, reason)
        }
    }
}

pub(crate) fn total_line(report: &RunReport) -> String {
    format!(
        "Total: {:.3}s ({} ok, {} failed, {} bytes, {})",
        report.total_duration.as_secs_f64(),
        report.succeeded(),
        report.failed(),
        report.total_bytes(),
        report.strategy
    )
}

fn output_dir(args: &RunArgs, cfg: &FanfetchConfig) -> Result<PathBuf> {
    let dir = match args.output_dir.clone().or_else(|| cfg.output_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("current directory")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create output directory {}", dir.display()))?;
    Ok(dir)
}

pub async fn run_fetch(args: &RunArgs, cfg: &FanfetchConfig) -> Result<()> {
    // Everything that can fail the run happens before dispatch.
    let targets = resolve_targets(explicit_links(&args.links), &cfg.target_source())?;
    let config = executor_config(args.strategy.as_deref(), args.jobs, cfg)?;
    let dir = output_dir(args, cfg)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<FetchResult>();
    let ctx = RunContext::new(Sink::new(dir))
        .with_fetch_options(cfg.fetch_options())
        .with_retry(retry_policy(cfg))
        .with_events(tx);

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(result) = rx.recv().await {
            if !json {
                println!("{}", unit_line(&result));
            }
        }
    });

    let report = tokio::task::spawn_blocking(move || executor::run(&targets, &config, ctx))
        .await
        .context("fetch task join")?;
    printer.await.context("printer task join")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", total_line(&report));
    }
    Ok(())
}
