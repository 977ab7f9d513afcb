//! Fan-out coordinator: spawns one worker per identifier and merges their
//! outcomes into a single arrival-ordered stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use super::Fetcher;
use super::worker::{WorkerExit, WorkerParams, run_worker};
use crate::types::{FetchOutcome, Identifier};

/// Per-batch accounting, complete once the stream is exhausted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Identifiers supplied to `fetch_all`
    pub requested: usize,
    /// Worker tasks actually spawned
    pub spawned: usize,
    /// Outcomes yielded to the consumer
    pub delivered: usize,
    /// Workers that published an outcome
    pub published: usize,
    /// Workers that produced an outcome but were cancelled before publishing
    pub discarded: usize,
    /// Workers cancelled while their request was in flight
    pub abandoned: usize,
    /// Workers cancelled before they started
    pub not_started: usize,
    /// Workers whose outcome found the channel closed
    pub sink_closed: usize,
    /// Worker tasks that panicked
    pub panicked: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Forwarding outcomes from the channel
    Receiving,
    /// No more outcomes will be yielded; waiting for worker tasks to finish
    Draining,
    /// Every worker has finished
    Done,
}

/// Lazy, finite, non-restartable stream of [`FetchOutcome`]s for one batch.
///
/// The stream ends when every worker has published or the batch is cancelled.
/// In both cases it only returns `None` after every worker task has finished,
/// so nothing is left running once it is exhausted. Dropping the stream early
/// cancels the batch and aborts the remaining workers.
pub struct OutcomeStream {
    rx: mpsc::Receiver<FetchOutcome>,
    tasks: JoinSet<WorkerExit>,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    state: StreamState,
    summary: BatchSummary,
}

impl OutcomeStream {
    fn new(
        rx: mpsc::Receiver<FetchOutcome>,
        tasks: JoinSet<WorkerExit>,
        cancel: CancellationToken,
        requested: usize,
    ) -> Self {
        let summary = BatchSummary {
            requested,
            spawned: tasks.len(),
            ..BatchSummary::default()
        };
        Self {
            rx,
            tasks,
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            cancel,
            state: StreamState::Receiving,
            summary,
        }
    }

    /// Accounting so far; final once the stream has returned `None`
    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// Worker tasks that have not been reaped yet
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the stream has been exhausted
    pub fn is_terminated(&self) -> bool {
        self.state == StreamState::Done
    }

    fn record(&mut self, joined: Result<WorkerExit, JoinError>) {
        match joined {
            Ok(WorkerExit::Published) => self.summary.published += 1,
            Ok(WorkerExit::Discarded) => self.summary.discarded += 1,
            Ok(WorkerExit::Abandoned) => self.summary.abandoned += 1,
            Ok(WorkerExit::NotStarted) => self.summary.not_started += 1,
            Ok(WorkerExit::SinkClosed) => self.summary.sink_closed += 1,
            Err(e) if e.is_panic() => {
                self.summary.panicked += 1;
                tracing::error!(error = %e, "fetch worker panicked");
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch worker did not complete");
            }
        }
    }
}

impl Stream for OutcomeStream {
    type Item = FetchOutcome;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.state {
                StreamState::Receiving => {
                    if this.cancelled.as_mut().poll(cx).is_ready() {
                        tracing::debug!(
                            delivered = this.summary.delivered,
                            pending = this.tasks.len(),
                            "batch cancelled, draining workers"
                        );
                        // Buffered outcomes are dropped; blocked senders fail fast.
                        this.rx.close();
                        this.state = StreamState::Draining;
                        continue;
                    }
                    match this.rx.poll_recv(cx) {
                        Poll::Ready(Some(outcome)) => {
                            this.summary.delivered += 1;
                            return Poll::Ready(Some(outcome));
                        }
                        Poll::Ready(None) => {
                            this.state = StreamState::Draining;
                        }
                        Poll::Pending => return Poll::Pending,
                    }
                }
                StreamState::Draining => match this.tasks.poll_join_next(cx) {
                    Poll::Ready(Some(joined)) => this.record(joined),
                    Poll::Ready(None) => {
                        this.state = StreamState::Done;
                        tracing::debug!(summary = ?this.summary, "fan-out batch finished");
                    }
                    Poll::Pending => return Poll::Pending,
                },
                StreamState::Done => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            StreamState::Receiving => (
                self.rx.len(),
                Some(self.summary.spawned - self.summary.delivered),
            ),
            StreamState::Draining | StreamState::Done => (0, Some(0)),
        }
    }
}

impl Drop for OutcomeStream {
    fn drop(&mut self) {
        // Only the batch-scoped child token; the caller's token is untouched.
        // Remaining tasks are aborted when the JoinSet drops.
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for OutcomeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeStream")
            .field("state", &self.state)
            .field("pending_tasks", &self.tasks.len())
            .field("summary", &self.summary)
            .finish()
    }
}

impl Fetcher {
    /// Fetch every identifier concurrently and stream the outcomes as they complete.
    ///
    /// One worker task is spawned per identifier (duplicates included), with no
    /// concurrency cap. Activating `cancel` stops the batch: workers that have
    /// not published yet exit without publishing, in-flight requests are
    /// dropped, and the stream ends once they have all finished.
    ///
    /// An empty identifier list yields a stream that is exhausted on first poll.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fetch_all<I>(&self, identifiers: I, cancel: CancellationToken) -> OutcomeStream
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let batch = cancel.child_token();
        let (tx, rx) = mpsc::channel(self.outcome_buffer);
        let mut tasks = JoinSet::new();
        let mut requested = 0;

        for identifier in identifiers {
            requested += 1;
            if batch.is_cancelled() {
                continue;
            }
            tasks.spawn(run_worker(WorkerParams {
                identifier: identifier.into(),
                provider: Arc::clone(&self.provider),
                sink: tx.clone(),
                cancel: batch.clone(),
            }));
        }
        // Workers hold the only senders, so the channel closes when the last one exits.
        drop(tx);

        if tasks.len() < requested {
            tracing::debug!(
                requested,
                spawned = tasks.len(),
                "batch cancelled while spawning, remaining identifiers skipped"
            );
        } else {
            tracing::debug!(requested, "fan-out batch started");
        }

        OutcomeStream::new(rx, tasks, batch, requested)
    }
}
