//! Portfolio REST API server
//!
//! Runs the user API against the RapidAPI IEX quote gateway. Credentials come
//! from the environment (or a `.env` file):
//!
//! - `RAPID_API_KEY` - gateway key (required)
//! - `RAPID_API_HOST` - gateway host (default: the IEX host)
//! - `BIND_ADDRESS` - listen address (default: 127.0.0.1:8080)
//! - `FETCH_DEADLINE_SECS` - upper bound on one portfolio refresh (default: none)
//! - `RUST_LOG` - log filter (default: info)
//!
//! Usage: cargo run --example portfolio_server
//!
//! Then:
//!   curl -X POST http://localhost:8080/user/create \
//!     -H 'Content-Type: application/json' \
//!     -d '{"Id": 1, "Email": "ada@example.com", "Firstname": "Ada", "Lastname": "Lovelace", "Stocks": ["AAPL", "MSFT"]}'
//!   curl http://localhost:8080/user/all

use std::sync::Arc;
use std::time::Duration;

use portfolio_feed::{Config, UserService, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::default();
    config.provider.api_key = Some(std::env::var("RAPID_API_KEY")?);
    if let Ok(host) = std::env::var("RAPID_API_HOST") {
        config.provider.base_url = format!("https://{host}");
        config.provider.host = host;
    }
    if let Ok(addr) = std::env::var("BIND_ADDRESS") {
        config.api.bind_address = addr.parse()?;
    }
    if let Ok(secs) = std::env::var("FETCH_DEADLINE_SECS") {
        config.fetch_deadline = Some(Duration::from_secs(secs.parse()?));
    }
    config.validate()?;

    let service = UserService::from_config(&config)?;

    println!("Portfolio API: http://{}", config.api.bind_address);
    println!("Swagger UI:    http://{}/swagger-ui", config.api.bind_address);

    run_with_shutdown(service, Arc::new(config)).await?;
    Ok(())
}
