//! Bounded thread pool with an mpsc fan-in, shared by the parallel-worker and
//! isolated-process strategies.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use crate::error::FetchError;
use crate::report::{FetchResult, Outcome};
use crate::targets::FetchTarget;

use super::{Indexed, RunContext};

/// Runs `unit` for every target on up to `workers` scoped threads. Results are
/// reported to `ctx` as they arrive and returned tagged with their target index.
pub(super) fn run_pool<F>(targets: &[FetchTarget], workers: usize, ctx: &RunContext, unit: F) -> Indexed
where
    F: Fn(&FetchTarget) -> FetchResult + Sync,
{
    let queue: Mutex<VecDeque<usize>> = Mutex::new((0..targets.len()).collect());
    let next = || queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
    let mut out: Indexed = Vec::with_capacity(targets.len());

    thread::scope(|s| {
        let (tx, rx) = mpsc::channel::<(usize, FetchResult)>();
        let mut spawned = 0usize;
        for n in 0..workers.max(1) {
            let tx = tx.clone();
            let (next, unit) = (&next, &unit);
            let spawn = thread::Builder::new()
                .name(format!("fanfetch-worker-{n}"))
                .spawn_scoped(s, move || {
                    while let Some(i) = next() {
                        if tx.send((i, guarded(unit, &targets[i]))).is_err() {
                            break;
                        }
                    }
                });
            match spawn {
                Ok(_) => spawned += 1,
                Err(e) => {
                    tracing::warn!(worker = n, "failed to spawn worker thread: {}", e);
                    break;
                }
            }
        }
        drop(tx);
        if spawned == 0 {
            tracing::warn!("no worker threads available; running units on the calling thread");
        }

        // Ends once every worker has exited and dropped its sender.
        for (i, result) in rx {
            ctx.notify(&result);
            out.push((i, result));
        }
    });

    // Only non-empty when no thread could be spawned at all.
    while let Some(i) = next() {
        let result = guarded(&unit, &targets[i]);
        ctx.notify(&result);
        out.push((i, result));
    }
    out
}

/// Runs one unit, turning a panic into a worker failure so the target still
/// gets a terminal result and the thread keeps serving the queue.
fn guarded<F>(unit: &F, target: &FetchTarget) -> FetchResult
where
    F: Fn(&FetchTarget) -> FetchResult,
{
    let started = Instant::now();
    match panic::catch_unwind(AssertUnwindSafe(|| unit(target))) {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(locator = target.locator(), "unit panicked");
            let err = FetchError::Worker("unit panicked".to_string());
            FetchResult::failure(target, Outcome::from(&err), started.elapsed(), 1)
        }
    }
}
