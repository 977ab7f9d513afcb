//! Configuration types for portfolio-feed

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, time::Duration};
use url::Url;

/// Quote provider transport configuration (endpoint and credentials)
///
/// Supplied once when the [`HttpQuoteClient`](crate::client::HttpQuoteClient) is
/// constructed, never per call.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the quote service (default: the RapidAPI IEX gateway)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value sent as the `x-rapidapi-host` header
    #[serde(default = "default_provider_host")]
    pub host: String,

    /// Value sent as the `x-rapidapi-key` header (omitted when None)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout, serialized as whole seconds (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl ProviderConfig {
    /// Create a provider config for the given endpoint and credentials
    pub fn new(
        base_url: impl Into<String>,
        host: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            host: host.into(),
            api_key,
            request_timeout: default_request_timeout(),
        }
    }

    /// Override the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check that the endpoint is usable before any request is made
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;
        if self.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request_timeout must be greater than zero".to_string(),
                key: Some("provider.request_timeout".to_string()),
            });
        }
        Ok(())
    }

    /// Parse `base_url`, accepting only http(s) URLs with a host
    pub fn parsed_base_url(&self) -> Result<Url> {
        let invalid = |message: String| Error::Config {
            message,
            key: Some("provider.base_url".to_string()),
        };

        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(invalid("base_url must not be empty".to_string()));
        }

        let parsed =
            Url::parse(base).map_err(|e| invalid(format!("base_url {base:?} is not a URL: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(invalid(format!(
                    "base_url scheme '{scheme}' is not allowed; only http and https are supported"
                )));
            }
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid(format!("base_url {base:?} has no host")));
        }

        Ok(parsed)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            host: default_provider_host(),
            api_key: None,
            request_timeout: default_request_timeout(),
        }
    }
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Fan-out behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Capacity of the outcome channel shared by all workers of one batch (default: 16)
    ///
    /// A worker that finds the channel full waits until the consumer drains it
    /// or the batch is cancelled. Values below 1 are treated as 1.
    #[serde(default = "default_outcome_buffer")]
    pub outcome_buffer: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            outcome_buffer: default_outcome_buffer(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration
///
/// Only `provider` has to be present when deserializing; the other sections
/// fall back to their defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Quote provider endpoint and credentials
    pub provider: ProviderConfig,

    /// Fan-out settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Upper bound on a single portfolio refresh, in seconds (None = wait for every ticker)
    #[serde(default, with = "optional_duration_serde")]
    pub fetch_deadline: Option<Duration>,
}

impl Config {
    /// Validate every section that can be checked without network access
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()
    }
}

fn default_base_url() -> String {
    "https://investors-exchange-iex-trading.p.rapidapi.com".to_string()
}

fn default_provider_host() -> String {
    "investors-exchange-iex-trading.p.rapidapi.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_outcome_buffer() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
