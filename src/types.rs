//! Core types: payloads, fetch outcomes and user records

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque token naming one thing to fetch (e.g. a ticker symbol)
pub type Identifier = String;

/// A price observed at a point in time
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricePoint {
    /// Price in the quote currency
    pub price: f64,
    /// Observation time in epoch milliseconds
    pub time: i64,
}

/// Open/high/low/close snapshot for one symbol, as returned by the quote service
///
/// Field names follow the remote wire format. The symbol is written as
/// `Symbol` and read from either `Symbol` or `symbol`; when the service omits
/// it, the client fills in the identifier that was requested.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockData {
    /// Ticker symbol
    #[serde(rename = "Symbol", alias = "symbol", default)]
    pub symbol: String,
    /// Opening price and time
    pub open: PricePoint,
    /// Closing price and time
    pub close: PricePoint,
    /// Session high
    pub high: f64,
    /// Session low
    pub low: f64,
}

/// Result of fetching one identifier
///
/// Exactly one outcome is produced for every identifier a worker runs for.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The identifier was fetched and decoded
    Fetched {
        /// Identifier the request was issued for
        identifier: Identifier,
        /// Decoded payload
        payload: StockData,
    },
    /// The fetch failed; the batch carries on
    Failed {
        /// Identifier the request was issued for
        identifier: Identifier,
        /// Why it failed
        error: FetchError,
    },
}

impl FetchOutcome {
    /// Tag a client result with the identifier it was fetched for
    pub fn new(identifier: Identifier, result: Result<StockData, FetchError>) -> Self {
        match result {
            Ok(payload) => FetchOutcome::Fetched {
                identifier,
                payload,
            },
            Err(error) => FetchOutcome::Failed { identifier, error },
        }
    }

    /// Identifier this outcome belongs to
    pub fn identifier(&self) -> &str {
        match self {
            FetchOutcome::Fetched { identifier, .. } | FetchOutcome::Failed { identifier, .. } => {
                identifier
            }
        }
    }

    /// Whether the fetch succeeded
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }

    /// Drop the tag and return the underlying result
    pub fn into_result(self) -> Result<StockData, FetchError> {
        match self {
            FetchOutcome::Fetched { payload, .. } => Ok(payload),
            FetchOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// A user and the portfolio built from their chosen tickers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique user id
    #[serde(rename = "Id")]
    pub id: i64,
    /// Contact email
    #[serde(rename = "Email", default)]
    pub email: String,
    /// Given name
    #[serde(rename = "Firstname", default)]
    pub first_name: String,
    /// Family name
    #[serde(rename = "Lastname", default)]
    pub last_name: String,
    /// Ticker symbols the user follows
    #[serde(rename = "Stocks", default)]
    pub stocks: Vec<Identifier>,
    /// Latest quotes for `stocks`, in the order they arrived
    #[serde(rename = "Portfolio", default)]
    pub portfolio: Vec<StockData>,
}

/// Replacement fields for an existing user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    /// New contact email
    #[serde(rename = "Email", default)]
    pub email: String,
    /// New given name
    #[serde(rename = "Firstname", default)]
    pub first_name: String,
    /// New family name
    #[serde(rename = "Lastname", default)]
    pub last_name: String,
    /// New ticker list; the portfolio is rebuilt from it
    #[serde(rename = "Stocks", default)]
    pub stocks: Vec<Identifier>,
}
