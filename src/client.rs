//! Outbound quote client
//!
//! [`QuoteProvider`] is the seam between the fan-out machinery and the network:
//! one call, one identifier, one request. [`HttpQuoteClient`] is the production
//! implementation backed by reqwest.

use crate::config::ProviderConfig;
use crate::error::{FetchError, Result};
use crate::types::StockData;
use url::Url;

/// Header carrying the RapidAPI gateway host
const HOST_HEADER: &str = "x-rapidapi-host";

/// Header carrying the RapidAPI key
const KEY_HEADER: &str = "x-rapidapi-key";

/// Abstraction over single-identifier quote fetching, enabling testability.
///
/// Implementations must issue at most one outbound attempt per call and must
/// not retry. Dropping the returned future must release any connection it holds.
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current OHLC snapshot for `identifier`
    async fn fetch(&self, identifier: &str) -> std::result::Result<StockData, FetchError>;
}

/// Production [`QuoteProvider`] talking to the RapidAPI IEX gateway.
#[derive(Debug, Clone)]
pub struct HttpQuoteClient {
    client: reqwest::Client,
    config: ProviderConfig,
    base_url: Url,
}

impl HttpQuoteClient {
    /// Create a client for the configured endpoint.
    ///
    /// Fails if the configuration is unusable or the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("portfolio-feed/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;
        Self::with_client(client, config)
    }

    /// Create a client around an existing reqwest::Client (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Endpoint configuration this client was built with
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// `{base}/stock/{identifier}/ohlc`, with the identifier as one encoded segment
    fn quote_url(&self, identifier: &str) -> std::result::Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                transport_error(
                    identifier,
                    None,
                    format!("base URL {} cannot carry a path", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(["stock", identifier, "ohlc"]);
        Ok(url)
    }
}

fn transport_error(identifier: &str, status: Option<u16>, reason: String) -> FetchError {
    FetchError::Transport {
        identifier: identifier.to_string(),
        status,
        reason,
    }
}

#[async_trait::async_trait]
impl QuoteProvider for HttpQuoteClient {
    async fn fetch(&self, identifier: &str) -> std::result::Result<StockData, FetchError> {
        let url = self.quote_url(identifier)?;
        tracing::debug!(identifier = %identifier, url = %url, "requesting quote");

        let mut request = self
            .client
            .get(url)
            .header(HOST_HEADER, &self.config.host)
            .timeout(self.config.request_timeout);
        if let Some(key) = &self.config.api_key {
            request = request.header(KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("request timed out: {e}")
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                format!("request failed: {e}")
            };
            transport_error(identifier, None, reason)
        })?;

        let status = response.status();

        // Drained on every path, including error statuses.
        let body = response.bytes().await.map_err(|e| {
            transport_error(
                identifier,
                Some(status.as_u16()),
                format!("failed to read response body: {e}"),
            )
        })?;

        if !status.is_success() {
            return Err(transport_error(
                identifier,
                Some(status.as_u16()),
                format!("endpoint returned {status}"),
            ));
        }

        let mut data: StockData =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                identifier: identifier.to_string(),
                source,
            })?;
        if data.symbol.is_empty() {
            data.symbol = identifier.to_string();
        }

        tracing::debug!(identifier = %identifier, "quote decoded");
        Ok(data)
    }
}
