//! One unit: fetch a target and write its payload.

use std::time::Instant;

use crate::error::{FetchError, UnitError};
use crate::fetch;
use crate::report::{FetchResult, Outcome};
use crate::retry::run_with_retry;
use crate::targets::FetchTarget;

use super::RunContext;

/// Fetches `target` (with retry if configured) and writes it to the sink,
/// blocking the calling thread. Always returns a terminal result.
pub fn run_unit(target: &FetchTarget, ctx: &RunContext) -> FetchResult {
    let started = Instant::now();
    let (fetched, attempts) = run_with_retry(ctx.retry(), || {
        fetch::fetch_payload(target.locator(), ctx.fetch_options())
    });
    finish_unit(target, ctx, started, fetched, attempts)
}

/// Writes a fetched payload (or records the fetch failure) and stamps the
/// elapsed time since `started`.
pub(super) fn finish_unit(
    target: &FetchTarget,
    ctx: &RunContext,
    started: Instant,
    fetched: Result<Vec<u8>, FetchError>,
    attempts: u32,
) -> FetchResult {
    let result = match store(target, ctx, fetched) {
        Ok(bytes) => FetchResult::success(target, bytes, started.elapsed(), attempts),
        Err(e) => FetchResult::failure(target, Outcome::from_error(&e), started.elapsed(), attempts),
    };
    match &result.outcome {
        Outcome::Success => tracing::debug!(
            locator = target.locator(),
            name = target.destination_name(),
            bytes = result.byte_length,
            ms = result.duration.as_millis() as u64,
            "unit succeeded"
        ),
        Outcome::Failure { reason, .. } => tracing::warn!(
            locator = target.locator(),
            attempts,
            "unit failed: {}",
            reason
        ),
    }
    result
}

/// Writes the payload under the target's name; returns the bytes written.
fn store(
    target: &FetchTarget,
    ctx: &RunContext,
    fetched: Result<Vec<u8>, FetchError>,
) -> Result<u64, UnitError> {
    let payload = fetched?;
    ctx.sink().write(target.destination_name(), &payload)?;
    Ok(payload.len() as u64)
}
