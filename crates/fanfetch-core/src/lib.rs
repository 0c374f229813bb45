//! fanfetch core: fetch a list of remote resources concurrently under one of
//! three interchangeable strategies and write each payload to a local file.

pub mod compare;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod logging;
pub mod report;
pub mod retry;
pub mod sink;
pub mod strategy;
pub mod targets;
pub mod url_model;
pub mod worker;

pub use error::{ConfigError, FetchError, UnitError, WriteError};
pub use executor::{run, RunContext};
pub use report::{FailureKind, FetchResult, Outcome, RunReport};
pub use strategy::{select, ExecutorConfig, Strategy, WorkerCommand};
pub use targets::{resolve_targets, FetchTarget, TargetSource};
