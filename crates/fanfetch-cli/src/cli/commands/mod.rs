//! CLI command handlers, one file per command, plus the flag/config merging
//! they share.

mod bench;
mod completions;
mod fetch_one;
mod run;

pub use bench::run_bench;
pub use completions::run_completions;
pub use fetch_one::run_fetch_one;
pub use run::run_fetch;

use fanfetch_core::config::FanfetchConfig;
use fanfetch_core::retry::RetryPolicy;
use fanfetch_core::strategy::{self, ExecutorConfig};
use fanfetch_core::ConfigError;

/// Command-line flags win over config-file values.
pub(crate) fn executor_config(
    strategy_name: Option<&str>,
    jobs: Option<usize>,
    cfg: &FanfetchConfig,
) -> Result<ExecutorConfig, ConfigError> {
    let base = match strategy_name {
        Some(name) => strategy::select(name)?,
        None => ExecutorConfig::new(cfg.strategy),
    };
    Ok(base.with_max_in_flight(jobs.or(cfg.max_in_flight)))
}

pub(crate) fn retry_policy(cfg: &FanfetchConfig) -> Option<RetryPolicy> {
    cfg.retry.clone().map(RetryPolicy::from)
}

/// Explicit links, or `None` so the configured default list applies.
pub(crate) fn explicit_links(links: &[String]) -> Option<&[String]> {
    (!links.is_empty()).then_some(links)
}
