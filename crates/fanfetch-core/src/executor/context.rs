//! Per-run state passed into the executor.

use tokio::sync::mpsc::UnboundedSender;

use crate::fetch::FetchOptions;
use crate::report::FetchResult;
use crate::retry::RetryPolicy;
use crate::sink::Sink;

/// Everything a run needs besides targets and strategy. Lives exactly as
/// long as one `run` call.
#[derive(Debug, Clone)]
pub struct RunContext {
    sink: Sink,
    fetch: FetchOptions,
    retry: Option<RetryPolicy>,
    events: Option<UnboundedSender<FetchResult>>,
}

impl RunContext {
    pub fn new(sink: Sink) -> Self {
        Self {
            sink,
            fetch: FetchOptions::default(),
            retry: None,
            events: None,
        }
    }

    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_retry(mut self, retry: Option<RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Each result is also sent here as soon as its unit terminates.
    pub fn with_events(mut self, events: UnboundedSender<FetchResult>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn fetch_options(&self) -> &FetchOptions {
        &self.fetch
    }

    pub fn retry(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Receiver gone means nobody is listening; the run carries on.
    pub(crate) fn notify(&self, result: &FetchResult) {
        if let Some(tx) = &self.events {
            let _ = tx.send(result.clone());
        }
    }
}
