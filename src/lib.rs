//! # portfolio-feed
//!
//! Concurrent quote fetching for stock portfolios.
//!
//! ## Overview
//!
//! The core is a fan-out/fan-in fetcher: given a list of ticker symbols it
//! issues one request per symbol, all at once, and streams back a tagged
//! outcome for each as soon as it completes. A cancellation token stops the
//! whole batch at any time.
//!
//! Around the core sit a small user service that keeps each user's portfolio
//! in step with their ticker list, and an axum REST API exposing it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use portfolio_feed::{CancellationToken, Config, Fetcher, collect_outcomes};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.provider.api_key = Some("my-rapidapi-key".to_string());
//!
//!     let fetcher = Fetcher::from_config(&config)?;
//!     let stream = fetcher.fetch_all(["AAPL", "MSFT"], CancellationToken::new());
//!
//!     let report = collect_outcomes(stream).await;
//!     for quote in &report.quotes {
//!         println!("{}: {}", quote.symbol, quote.close.price);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Outbound quote client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Concurrent fan-out fetching
pub mod fetcher;
/// Outcome consumers
pub mod portfolio;
/// User service
pub mod service;
/// In-memory user store
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use client::{HttpQuoteClient, QuoteProvider};
pub use config::{ApiConfig, Config, FetchConfig, ProviderConfig};
pub use error::{ApiError, Error, ErrorDetail, FetchError, Result, ToHttpStatus};
pub use fetcher::{BatchSummary, CancellationToken, Fetcher, OutcomeStream, WorkerExit};
pub use portfolio::{PortfolioReport, collect_outcomes, collect_within};
pub use service::UserService;
pub use store::UserStore;
pub use types::{FetchOutcome, Identifier, PricePoint, StockData, User, UserUpdate};

/// Run the REST API until a termination signal arrives.
///
/// Binds `config.api.bind_address` and shuts the server down gracefully on the
/// first signal. In-flight requests are allowed to finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use portfolio_feed::{Config, UserService, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::default());
///     let service = UserService::from_config(&config)?;
///
///     run_with_shutdown(service, config).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: UserService, config: std::sync::Arc<Config>) -> Result<()> {
    api::start_api_server(service, config, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
