//! Retry and backoff for a single unit's fetch.
//!
//! Classification maps a `FetchError` to an `ErrorKind`; the policy turns
//! (attempt, kind) into a backoff decision. Write failures never reach here.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
