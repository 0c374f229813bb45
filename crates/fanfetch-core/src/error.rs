//! Error kinds for a run.
//!
//! `ConfigError` is the only run-fatal kind and is raised before any unit is
//! dispatched. `FetchError` and `WriteError` belong to a single unit and end up
//! inside that unit's `FetchResult`.

use thiserror::Error;

/// Bad or missing targets, or an unknown strategy. Fails the run before dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("empty locator at position {index}")]
    EmptyLocator { index: usize },

    #[error("malformed locator {locator:?}: {reason}")]
    MalformedLocator { locator: String, reason: String },

    #[error("locator {locator:?} has no usable final path segment for a file name")]
    NoDestinationName { locator: String },

    #[error("no targets given and no default target list configured")]
    NoTargets,

    #[error("unknown strategy {0:?} (expected parallel-worker, isolated-process or cooperative-concurrent)")]
    UnknownStrategy(String),
}

/// Retrieval failure for one target.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure reported by libcurl (DNS, connect, timeout, protocol).
    #[error("{0}")]
    Curl(#[from] curl::Error),

    /// The shared multi handle of the cooperative loop failed.
    #[error("{0}")]
    Multi(#[from] curl::MultiError),

    /// HTTP response with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),

    /// Isolated worker process could not be started or returned no usable report.
    #[error("worker: {0}")]
    Worker(String),
}

/// Storage failure while persisting one payload.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid destination name {0:?}")]
    InvalidName(String),

    #[error("write {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one unit: either the fetch or the write.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
