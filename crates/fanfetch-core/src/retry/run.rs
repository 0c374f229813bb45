//! Retry loop around one fetch attempt.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::FetchError;

/// Runs `f` until it succeeds or `policy` says stop; sleeps between attempts.
/// With no policy, `f` runs exactly once. Returns the final outcome and the
/// number of attempts made.
pub fn run_with_retry<T, F>(policy: Option<&RetryPolicy>, mut f: F) -> (Result<T, FetchError>, u32)
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        let err = match f() {
            Ok(v) => return (Ok(v), attempt),
            Err(e) => e,
        };
        let Some(policy) = policy else {
            return (Err(err), attempt);
        };
        match policy.decide(attempt, classify::classify(&err)) {
            RetryDecision::NoRetry => return (Err(err), attempt),
            RetryDecision::RetryAfter(d) => {
                tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "retrying fetch: {}", err);
                std::thread::sleep(d);
                attempt += 1;
            }
        }
    }
}
