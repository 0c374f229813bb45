//! Strategy selection: maps a strategy name to an executor configuration.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Hidden CLI subcommand that runs a single unit in a child process.
pub const WORKER_SUBCOMMAND: &str = "fetch-one";

/// Scheduling substrate for a run. All three give the same results for the
/// same targets; only how units are multiplexed differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// One preemptive OS thread per unit, sharing memory; joined at the end.
    ParallelWorker,
    /// One child process per unit with its own memory and descriptor table.
    IsolatedProcess,
    /// All units interleaved on one thread over a single curl multi loop.
    #[default]
    CooperativeConcurrent,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::ParallelWorker,
        Strategy::IsolatedProcess,
        Strategy::CooperativeConcurrent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::ParallelWorker => "parallel-worker",
            Strategy::IsolatedProcess => "isolated-process",
            Strategy::CooperativeConcurrent => "cooperative-concurrent",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|st| st.name() == s)
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
    }
}

/// Program launched for each unit of the isolated-process strategy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkerCommand {
    /// Re-execute the running binary with [`WORKER_SUBCOMMAND`].
    #[default]
    CurrentExe,
    /// Explicit program and leading arguments; the request JSON is appended last.
    Program { program: PathBuf, args: Vec<OsString> },
}

impl WorkerCommand {
    /// The fanfetch binary at `program`, invoked with [`WORKER_SUBCOMMAND`].
    pub fn fanfetch_binary(program: impl Into<PathBuf>) -> Self {
        WorkerCommand::Program {
            program: program.into(),
            args: vec![OsString::from(WORKER_SUBCOMMAND)],
        }
    }

    /// Resolve to (program, leading args). `CurrentExe` is resolved here, at
    /// dispatch time, so building a config stays free of side effects.
    pub fn resolve(&self) -> std::io::Result<(PathBuf, Vec<OsString>)> {
        match self {
            WorkerCommand::CurrentExe => Ok((
                std::env::current_exe()?,
                vec![OsString::from(WORKER_SUBCOMMAND)],
            )),
            WorkerCommand::Program { program, args } => Ok((program.clone(), args.clone())),
        }
    }
}

/// How the executor dispatches units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub strategy: Strategy,
    /// Upper bound on units running at once. `None` starts every unit immediately.
    pub max_in_flight: Option<usize>,
    /// Child program for [`Strategy::IsolatedProcess`]; ignored otherwise.
    pub worker: WorkerCommand,
}

impl ExecutorConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            max_in_flight: None,
            worker: WorkerCommand::default(),
        }
    }

    pub fn with_max_in_flight(mut self, max: Option<usize>) -> Self {
        self.max_in_flight = max.map(|n| n.max(1));
        self
    }

    pub fn with_worker(mut self, worker: WorkerCommand) -> Self {
        self.worker = worker;
        self
    }

    /// Effective number of concurrently running units for `count` targets.
    pub(crate) fn in_flight_for(&self, count: usize) -> usize {
        self.max_in_flight.unwrap_or(count).min(count).max(1)
    }
}

/// Selects the executor configuration for a strategy name.
pub fn select(strategy_name: &str) -> Result<ExecutorConfig, ConfigError> {
    strategy_name.parse::<Strategy>().map(ExecutorConfig::new)
}
