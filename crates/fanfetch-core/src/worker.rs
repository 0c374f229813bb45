//! Wire protocol between the isolated-process executor and its child
//! processes. The parent passes one [`WorkerRequest`] as a JSON argument to
//! the hidden `fetch-one` subcommand; the child runs the unit and prints one
//! [`WorkerReport`] as a single JSON line on stdout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::executor::{run_unit, RunContext};
use crate::fetch::FetchOptions;
use crate::report::Outcome;
use crate::retry::RetryPolicy;
use crate::sink::Sink;
use crate::targets::FetchTarget;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub target: FetchTarget,
    pub output_dir: PathBuf,
    pub fetch: FetchOptions,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

/// What the child reports back. The parent keeps its own clock for the
/// unit's duration; `duration_secs` is the child's view, for logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub destination_name: String,
    pub byte_length: u64,
    pub attempts: u32,
    pub outcome: Outcome,
    pub duration_secs: f64,
}

/// Parses a request and runs it. Only a malformed request is an error; a
/// failed fetch or write is reported inside the returned report.
pub fn serve(request_json: &str) -> Result<WorkerReport, serde_json::Error> {
    let request: WorkerRequest = serde_json::from_str(request_json)?;
    Ok(serve_request(request))
}

pub fn serve_request(request: WorkerRequest) -> WorkerReport {
    tracing::debug!(
        locator = request.target.locator(),
        pid = std::process::id(),
        "worker serving unit"
    );
    let ctx = RunContext::new(Sink::new(request.output_dir))
        .with_fetch_options(request.fetch)
        .with_retry(request.retry);
    let result = run_unit(&request.target, &ctx);
    WorkerReport {
        destination_name: result.destination_name,
        byte_length: result.byte_length,
        attempts: result.attempts,
        outcome: result.outcome,
        duration_secs: result.duration.as_secs_f64(),
    }
}
