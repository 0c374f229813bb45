//! Cooperative-concurrent dispatch: every transfer is an `Easy2` handle on
//! one curl multi handle, driven by a perform/messages/wait loop on the
//! calling thread. No unit ever blocks another; the only suspension point
//! is `Multi::wait`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use curl::multi::{Easy2Handle, Multi};

use crate::error::FetchError;
use crate::fetch::{self, Collector};
use crate::report::{FailureKind, FetchResult, Outcome};
use crate::retry::{classify, RetryDecision};
use crate::targets::FetchTarget;

use super::unit::finish_unit;
use super::{Indexed, RunContext};

const MAX_WAIT: Duration = Duration::from_millis(100);

/// One target moving through the loop.
#[derive(Debug, Clone, Copy)]
struct Unit {
    index: usize,
    attempt: u32,
    /// Set when first handed to curl; kept across retries.
    started: Option<Instant>,
}

struct EventLoop<'a> {
    // Declared before `multi`: handles must be detached before the multi handle drops.
    active: Vec<(Easy2Handle<Collector>, Unit)>,
    multi: Multi,
    targets: &'a [FetchTarget],
    ctx: &'a RunContext,
    in_flight: usize,
    pending: VecDeque<Unit>,
    retry_after: Vec<(Instant, Unit)>,
    out: Indexed,
}

pub(super) fn dispatch(targets: &[FetchTarget], in_flight: usize, ctx: &RunContext) -> Indexed {
    let mut lp = EventLoop {
        active: Vec::with_capacity(in_flight),
        multi: Multi::new(),
        targets,
        ctx,
        in_flight: in_flight.max(1),
        pending: (0..targets.len())
            .map(|index| Unit { index, attempt: 1, started: None })
            .collect(),
        retry_after: Vec::new(),
        out: Vec::with_capacity(targets.len()),
    };
    lp.run();
    lp.out
}

impl EventLoop<'_> {
    fn run(&mut self) {
        self.refill();
        while !self.is_done() {
            let running = match self.multi.perform() {
                Ok(n) => n,
                Err(e) => return self.fail_remaining(&format!("curl multi perform: {e}")),
            };

            let mut done: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
            let active = &self.active;
            self.multi.messages(|msg| {
                for (pos, (handle, _)) in active.iter().enumerate() {
                    if let Some(res) = msg.result_for2(handle) {
                        done.push((pos, res));
                        break;
                    }
                }
            });
            // Remove from the back so earlier positions stay valid.
            done.sort_by(|a, b| b.0.cmp(&a.0));
            for (pos, res) in done {
                let (handle, unit) = self.active.remove(pos);
                let locator = self.targets[unit.index].locator();
                let fetched = match self.multi.remove2(handle) {
                    Ok(mut easy) => res
                        .map_err(FetchError::from)
                        .and_then(|()| fetch::finish_transfer(locator, &mut easy)),
                    Err(e) => Err(FetchError::Multi(e)),
                };
                self.complete(unit, fetched);
            }

            self.refill();
            if self.is_done() {
                break;
            }
            if running > 0 || !self.active.is_empty() {
                let wait = self.next_retry_wait().min(MAX_WAIT);
                if let Err(e) = self.multi.wait(&mut [], wait) {
                    return self.fail_remaining(&format!("curl multi wait: {e}"));
                }
            } else if self.pending.is_empty() {
                // Only backed-off retries remain.
                std::thread::sleep(self.next_retry_wait().min(MAX_WAIT));
            }
        }
    }

    fn is_done(&self) -> bool {
        self.active.is_empty() && self.pending.is_empty() && self.retry_after.is_empty()
    }

    /// Retries the unit if the policy allows, otherwise writes or records it.
    fn complete(&mut self, unit: Unit, fetched: Result<Vec<u8>, FetchError>) {
        if let (Err(e), Some(policy)) = (&fetched, self.ctx.retry()) {
            if let RetryDecision::RetryAfter(d) = policy.decide(unit.attempt, classify(e)) {
                tracing::debug!(
                    locator = self.targets[unit.index].locator(),
                    attempt = unit.attempt,
                    delay_ms = d.as_millis() as u64,
                    "retrying fetch: {}",
                    e
                );
                let next = Unit { attempt: unit.attempt + 1, ..unit };
                self.retry_after.push((Instant::now() + d, next));
                return;
            }
        }
        let started = unit.started.unwrap_or_else(Instant::now);
        let result = finish_unit(&self.targets[unit.index], self.ctx, started, fetched, unit.attempt);
        self.ctx.notify(&result);
        self.out.push((unit.index, result));
    }

    /// Tops the active set up to `in_flight` from pending units first, then
    /// from retries whose backoff has elapsed.
    fn refill(&mut self) {
        let now = Instant::now();
        while self.active.len() < self.in_flight {
            let unit = if let Some(u) = self.pending.pop_front() {
                u
            } else if let Some(pos) = self.retry_after.iter().position(|(t, _)| now >= *t) {
                self.retry_after.remove(pos).1
            } else {
                break;
            };
            self.start(unit);
        }
    }

    fn start(&mut self, mut unit: Unit) {
        unit.started.get_or_insert_with(Instant::now);
        let target = &self.targets[unit.index];
        let added = fetch::new_transfer(target.locator(), self.ctx.fetch_options())
            .and_then(|easy| self.multi.add2(easy).map_err(FetchError::from));
        match added {
            Ok(handle) => self.active.push((handle, unit)),
            Err(e) => self.complete(unit, Err(e)),
        }
    }

    fn next_retry_wait(&self) -> Duration {
        let now = Instant::now();
        self.retry_after
            .iter()
            .map(|(t, _)| t.saturating_duration_since(now))
            .min()
            .unwrap_or(MAX_WAIT)
    }

    /// The multi handle is unusable: every unit not yet terminal fails.
    fn fail_remaining(&mut self, reason: &str) {
        tracing::error!("{}", reason);
        let mut left: Vec<Unit> = self.active.drain(..).map(|(_, u)| u).collect();
        left.extend(self.pending.drain(..));
        left.extend(self.retry_after.drain(..).map(|(_, u)| u));
        for unit in left {
            let target = &self.targets[unit.index];
            let outcome = Outcome::Failure {
                kind: FailureKind::Fetch,
                reason: reason.to_string(),
            };
            let elapsed = unit.started.map(|s| s.elapsed()).unwrap_or_default();
            let result = FetchResult::failure(target, outcome, elapsed, unit.attempt);
            self.ctx.notify(&result);
            self.out.push((unit.index, result));
        }
    }
}
