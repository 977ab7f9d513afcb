//! Concurrent fan-out fetching
//!
//! A [`Fetcher`] turns a list of identifiers into an [`OutcomeStream`]: one
//! worker task per identifier, all running at once, each publishing exactly one
//! [`FetchOutcome`](crate::types::FetchOutcome) onto a shared bounded channel.
//! The stream yields outcomes in the order they complete.
//!
//! Cancellation is cooperative and one-shot. The caller passes a
//! [`CancellationToken`]; the batch runs under a child of it, so cancelling the
//! caller's token stops the batch, and dropping the stream stops the batch
//! without touching the caller's token.
//!
//! ```text
//!  fetch_all(ids, cancel)
//!        │
//!        ├── worker(ids[0]) ──┐
//!        ├── worker(ids[1]) ──┼──▶ mpsc (bounded) ──▶ OutcomeStream ──▶ consumer
//!        └── worker(ids[n]) ──┘
//! ```

use crate::client::{HttpQuoteClient, QuoteProvider};
use crate::config::{Config, FetchConfig};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

pub use tokio_util::sync::CancellationToken;

mod coordinator;
mod worker;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use coordinator::{BatchSummary, OutcomeStream};
pub use worker::WorkerExit;

/// Fan-out coordinator over a shared [`QuoteProvider`]
///
/// Cheap to clone; clones share the provider (and its connection pool).
#[derive(Clone)]
pub struct Fetcher {
    provider: Arc<dyn QuoteProvider>,
    outcome_buffer: usize,
}

impl Fetcher {
    /// Create a fetcher over any provider
    pub fn new(provider: Arc<dyn QuoteProvider>, config: &FetchConfig) -> Self {
        Self {
            provider,
            outcome_buffer: config.outcome_buffer.max(1),
        }
    }

    /// Create a fetcher backed by [`HttpQuoteClient`] from the full configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpQuoteClient::new(config.provider.clone())?;
        Ok(Self::new(Arc::new(client), &config.fetch))
    }

    /// Capacity of the per-batch outcome channel
    pub fn outcome_buffer(&self) -> usize {
        self.outcome_buffer
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("outcome_buffer", &self.outcome_buffer)
            .finish_non_exhaustive()
    }
}
