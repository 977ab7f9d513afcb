//! Shared test helpers: a scripted in-memory quote provider that records
//! how every call ended.

use crate::client::QuoteProvider;
use crate::error::FetchError;
use crate::types::{PricePoint, StockData};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Deterministic payload for `symbol`.
pub(crate) fn sample_quote(symbol: &str) -> StockData {
    let seed = symbol.bytes().map(f64::from).sum::<f64>();
    StockData {
        symbol: symbol.to_string(),
        open: PricePoint {
            price: seed,
            time: 1_700_000_000_000,
        },
        close: PricePoint {
            price: seed + 1.5,
            time: 1_700_023_400_000,
        },
        high: seed + 2.0,
        low: seed - 1.0,
    }
}

enum MockResponse {
    Quote(StockData),
    Status(u16),
    Malformed,
    Panic,
}

/// Counts of provider calls by how they ended.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    started: AtomicUsize,
    completed: AtomicUsize,
    abandoned: AtomicUsize,
}

impl CallLog {
    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Calls that started but neither completed nor were dropped yet.
    ///
    /// Finished counts are loaded before `started`, so a call that starts and
    /// ends between the loads cannot push the result below zero.
    pub(crate) fn in_flight(&self) -> usize {
        let finished = self.completed() + self.abandoned();
        self.started().saturating_sub(finished)
    }

    pub(crate) async fn wait_for_started(&self, n: usize) {
        self.wait_until(|log| log.started() >= n).await;
    }

    pub(crate) async fn wait_for_completed(&self, n: usize) {
        self.wait_until(|log| log.completed() >= n).await;
    }

    pub(crate) async fn wait_until_idle(&self) {
        self.wait_until(|log| log.in_flight() == 0).await;
    }

    async fn wait_until(&self, condition: impl Fn(&Self) -> bool) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while !condition(self) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting on provider calls: {self:?}");
    }
}

/// Marks a call abandoned if its future is dropped before completing.
struct InFlight<'a> {
    log: &'a CallLog,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            self.log.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.log.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Scripted [`QuoteProvider`]; unknown identifiers answer with a 404 transport failure.
#[derive(Default)]
pub(crate) struct MockQuoteProvider {
    responses: HashMap<String, MockResponse>,
    delays: HashMap<String, Duration>,
    log: Arc<CallLog>,
}

impl MockQuoteProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_quote(mut self, identifier: &str) -> Self {
        self.responses.insert(
            identifier.to_string(),
            MockResponse::Quote(sample_quote(identifier)),
        );
        self
    }

    pub(crate) fn with_status(mut self, identifier: &str, status: u16) -> Self {
        self.responses
            .insert(identifier.to_string(), MockResponse::Status(status));
        self
    }

    pub(crate) fn with_malformed(mut self, identifier: &str) -> Self {
        self.responses
            .insert(identifier.to_string(), MockResponse::Malformed);
        self
    }

    pub(crate) fn with_panic(mut self, identifier: &str) -> Self {
        self.responses
            .insert(identifier.to_string(), MockResponse::Panic);
        self
    }

    pub(crate) fn with_delay(mut self, identifier: &str, delay: Duration) -> Self {
        self.delays.insert(identifier.to_string(), delay);
        self
    }

    pub(crate) fn log(&self) -> Arc<CallLog> {
        Arc::clone(&self.log)
    }
}

#[async_trait::async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn fetch(&self, identifier: &str) -> Result<StockData, FetchError> {
        self.log.started.fetch_add(1, Ordering::SeqCst);
        let mut guard = InFlight {
            log: &self.log,
            finished: false,
        };

        if let Some(delay) = self.delays.get(identifier) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.responses.get(identifier) {
            Some(MockResponse::Quote(data)) => Ok(data.clone()),
            Some(MockResponse::Status(status)) => Err(FetchError::Transport {
                identifier: identifier.to_string(),
                status: Some(*status),
                reason: format!("endpoint returned {status}"),
            }),
            Some(MockResponse::Malformed) => {
                let source = serde_json::from_str::<StockData>(r#"{"open": "soon"}"#)
                    .expect_err("body is malformed on purpose");
                Err(FetchError::Decode {
                    identifier: identifier.to_string(),
                    source,
                })
            }
            Some(MockResponse::Panic) => {
                guard.finished = true;
                panic!("scripted provider panic for {identifier}");
            }
            None => Err(FetchError::Transport {
                identifier: identifier.to_string(),
                status: Some(404),
                reason: "unknown symbol".to_string(),
            }),
        };

        guard.finished = true;
        result
    }
}
