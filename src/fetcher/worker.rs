//! Worker task: one identifier, one fetch, at most one published outcome.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::QuoteProvider;
use crate::types::{FetchOutcome, Identifier};

/// How a worker task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The batch was cancelled before the worker started; no request was made
    NotStarted,
    /// The batch was cancelled while the request was in flight; the request was dropped
    Abandoned,
    /// The outcome was handed to the consumer
    Published,
    /// The outcome was ready but the batch was cancelled before it could be published
    Discarded,
    /// The consumer went away before the outcome could be published
    SinkClosed,
}

/// Parameters for running a single worker
pub(super) struct WorkerParams {
    /// Identifier to fetch
    pub(super) identifier: Identifier,
    /// Provider shared by every worker of the batch
    pub(super) provider: Arc<dyn QuoteProvider>,
    /// Outcome channel shared by every worker of the batch
    pub(super) sink: mpsc::Sender<FetchOutcome>,
    /// Batch-scoped cancellation token
    pub(super) cancel: CancellationToken,
}

/// Fetch one identifier and publish the tagged outcome unless the batch was cancelled.
///
/// The in-flight fetch is raced against cancellation; losing the race drops the
/// fetch future, which releases its connection.
pub(super) async fn run_worker(params: WorkerParams) -> WorkerExit {
    let WorkerParams {
        identifier,
        provider,
        sink,
        cancel,
    } = params;

    if cancel.is_cancelled() {
        tracing::debug!(identifier = %identifier, "batch cancelled before worker started");
        return WorkerExit::NotStarted;
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(identifier = %identifier, "batch cancelled, abandoning in-flight fetch");
            return WorkerExit::Abandoned;
        }
        result = provider.fetch(&identifier) => result,
    };

    let outcome = FetchOutcome::new(identifier.clone(), result);

    if cancel.is_cancelled() {
        tracing::debug!(identifier = %identifier, "batch cancelled, discarding outcome");
        return WorkerExit::Discarded;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(identifier = %identifier, "batch cancelled while publishing, discarding outcome");
            WorkerExit::Discarded
        }
        sent = sink.send(outcome) => match sent {
            Ok(()) => {
                tracing::debug!(identifier = %identifier, "outcome published");
                WorkerExit::Published
            }
            Err(_) => {
                tracing::debug!(identifier = %identifier, "outcome channel closed, dropping outcome");
                WorkerExit::SinkClosed
            }
        },
    }
}
