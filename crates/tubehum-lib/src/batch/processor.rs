use super::reporter::ProgressReporter;
use super::state::{BatchProgress, BatchState};
use crate::classify::FailureClass;
use crate::download::{DownloadRequest, ItemResult};
use crate::fetcher::ItemFetch;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
    /// Maximum number of fetch operations running at once.
    pub workers: usize,
    pub item_timeout: Duration,
    /// How long in-flight items may keep running once cancellation is seen.
    pub cancel_grace: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            item_timeout: Duration::from_secs(1800),
            cancel_grace: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BatchEvent {
    pub result: ItemResult,
    pub progress: BatchProgress,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchSummary {
    pub progress: BatchProgress,
    pub elapsed: Duration,
    /// In completion order.
    pub results: Vec<ItemResult>,
}

pub struct BatchProcessor {
    fetcher: Arc<dyn ItemFetch>,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(fetcher: Arc<dyn ItemFetch>, mut options: BatchOptions) -> Self {
        options.workers = options.workers.max(1);
        Self { fetcher, options }
    }

    /// Starts a run. Nothing is dispatched until the first
    /// [`BatchRun::next_event`] call.
    pub fn start(&self, requests: Vec<DownloadRequest>, cancel: CancellationToken) -> BatchRun {
        BatchRun {
            fetcher: self.fetcher.clone(),
            options: self.options,
            state: BatchState::new(requests.len()),
            queue: requests.into(),
            in_flight: FuturesUnordered::new(),
            workers: Vec::new(),
            cancel,
            stop_now: CancellationToken::new(),
            drain_deadline: None,
        }
    }
}

enum Wakeup {
    Completed(Option<ItemResult>),
    CancelRequested,
    GraceExpired,
    StopRequested,
}

/// One batch in progress. Owned by the coordinating task, which is the only
/// place its state is read or written.
pub struct BatchRun {
    fetcher: Arc<dyn ItemFetch>,
    options: BatchOptions,
    state: BatchState,
    queue: VecDeque<DownloadRequest>,
    in_flight: FuturesUnordered<BoxFuture<'static, ItemResult>>,
    workers: Vec<AbortHandle>,
    cancel: CancellationToken,
    stop_now: CancellationToken,
    drain_deadline: Option<Instant>,
}

impl BatchRun {
    /// Once `stop_now` fires during a cancelled run, in-flight items are
    /// aborted without waiting for the rest of the grace period.
    pub fn with_stop_token(mut self, stop_now: CancellationToken) -> Self {
        self.stop_now = stop_now;
        self
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn dispatch(&mut self, request: DownloadRequest) {
        let fetcher = self.fetcher.clone();
        let item_timeout = self.options.item_timeout;
        let source_url = request.source_url.clone();

        tracing::debug!(url = %source_url, "Dispatching");
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(item_timeout, fetcher.fetch_item(&request)).await {
                Ok(result) => result,
                Err(_) => ItemResult::failed(
                    request.source_url.clone(),
                    item_timeout,
                    FailureClass::Timeout,
                    format!(
                        "{}: no result after {}s",
                        FailureClass::Timeout,
                        item_timeout.as_secs()
                    ),
                ),
            }
        });

        self.workers.retain(|worker| !worker.is_finished());
        self.workers.push(handle.abort_handle());
        self.in_flight.push(
            async move {
                handle.await.unwrap_or_else(|e| {
                    ItemResult::failed(
                        source_url,
                        Duration::ZERO,
                        FailureClass::Unclassified,
                        format!("{}: worker crashed: {}", FailureClass::Unclassified, e),
                    )
                })
            }
            .boxed(),
        );
    }

    fn begin_drain(&mut self) {
        if self.drain_deadline.is_some() {
            return;
        }
        self.state.mark_cancelled();
        let dropped = self.queue.len();
        self.queue.clear();
        self.drain_deadline = Some(Instant::now() + self.options.cancel_grace);
        tracing::warn!(
            dropped,
            in_flight = self.in_flight.len(),
            "Cancellation requested, letting in-flight items finish"
        );
    }

    /// Aborts every worker still running and waits until each has been torn
    /// down, so their extractor processes are gone once this returns.
    async fn abort_in_flight(&mut self) {
        let abandoned = self.in_flight.len();
        for worker in self.workers.drain(..) {
            worker.abort();
        }
        while self.in_flight.next().await.is_some() {}
        if abandoned > 0 {
            tracing::warn!(abandoned, "Aborted in-flight items");
        }
    }

    /// Waits for the next finished item. Returns `None` once every item has
    /// been delivered, or once a cancelled run has drained (or aborted) its
    /// in-flight items.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        loop {
            if self.cancel.is_cancelled() {
                self.begin_drain();
            } else {
                while self.in_flight.len() < self.options.workers {
                    let Some(request) = self.queue.pop_front() else {
                        break;
                    };
                    self.dispatch(request);
                }
            }

            if self.in_flight.is_empty() {
                return None;
            }

            let wakeup = match self.drain_deadline {
                Some(deadline) => tokio::select! {
                    result = self.in_flight.next() => Wakeup::Completed(result),
                    _ = tokio::time::sleep_until(deadline) => Wakeup::GraceExpired,
                    _ = self.stop_now.cancelled() => Wakeup::StopRequested,
                },
                None => tokio::select! {
                    result = self.in_flight.next() => Wakeup::Completed(result),
                    _ = self.cancel.cancelled() => Wakeup::CancelRequested,
                },
            };

            match wakeup {
                Wakeup::Completed(Some(result)) => {
                    self.state.record(&result);
                    return Some(BatchEvent {
                        progress: self.state.snapshot(),
                        result,
                    });
                }
                Wakeup::Completed(None) | Wakeup::CancelRequested => continue,
                Wakeup::GraceExpired => {
                    tracing::warn!("Grace period expired");
                    self.abort_in_flight().await;
                    return None;
                }
                Wakeup::StopRequested => {
                    tracing::warn!("Stop requested, not waiting for the grace period");
                    self.abort_in_flight().await;
                    return None;
                }
            }
        }
    }

    /// Drives the run to its end, forwarding every event to `reporter`.
    pub async fn run_to_end(mut self, reporter: &mut dyn ProgressReporter) -> BatchSummary {
        let mut results = Vec::with_capacity(self.state.total());

        while let Some(event) = self.next_event().await {
            reporter.item_finished(&event.result);
            reporter.progress(&event.progress);
            results.push(event.result);
        }

        BatchSummary {
            progress: self.state.snapshot(),
            elapsed: self.state.elapsed(),
            results,
        }
    }
}
