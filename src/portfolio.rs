//! Outcome consumers that fold a fan-out stream into a portfolio.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::types::{FetchOutcome, StockData};

/// What one fan-out batch produced
#[derive(Debug, Default)]
pub struct PortfolioReport {
    /// Successfully fetched payloads, in arrival order
    pub quotes: Vec<StockData>,
    /// Failures, in arrival order
    pub failures: Vec<FetchError>,
    /// Whether the batch was cut short by a deadline
    pub deadline_exceeded: bool,
}

impl PortfolioReport {
    /// Every identifier was fetched and nothing was cut short
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.deadline_exceeded
    }

    /// Identifiers that failed, in arrival order
    pub fn failed_identifiers(&self) -> Vec<&str> {
        self.failures.iter().map(FetchError::identifier).collect()
    }

    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Fetched { payload, .. } => self.quotes.push(payload),
            FetchOutcome::Failed { identifier, error } => {
                tracing::warn!(identifier = %identifier, error = %error, "failed to fetch quote");
                self.failures.push(error);
            }
        }
    }
}

/// Drain `stream` to exhaustion.
pub async fn collect_outcomes<S>(stream: S) -> PortfolioReport
where
    S: Stream<Item = FetchOutcome>,
{
    let mut report = PortfolioReport::default();
    let mut stream = std::pin::pin!(stream);
    while let Some(outcome) = stream.next().await {
        report.record(outcome);
    }
    report
}

/// Drain `stream`, cancelling the batch through `cancel` once `deadline` elapses.
///
/// After the deadline fires the stream still has to end, which it does as soon
/// as the remaining workers observe the cancellation.
pub async fn collect_within<S>(
    stream: S,
    cancel: &CancellationToken,
    deadline: Duration,
) -> PortfolioReport
where
    S: Stream<Item = FetchOutcome>,
{
    let mut report = PortfolioReport::default();
    let mut stream = std::pin::pin!(stream);
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            next = stream.next() => match next {
                Some(outcome) => report.record(outcome),
                None => break,
            },
            () = &mut timer, if !report.deadline_exceeded => {
                tracing::warn!(
                    deadline_secs = deadline.as_secs_f64(),
                    received = report.quotes.len() + report.failures.len(),
                    "fetch deadline elapsed, cancelling remaining requests"
                );
                report.deadline_exceeded = true;
                cancel.cancel();
            }
        }
    }
    report
}
