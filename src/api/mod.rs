//! REST API server module
//!
//! Exposes the user service over HTTP: user CRUD, each create/edit refreshing
//! the user's portfolio through the concurrent fetcher.

use crate::{Config, Result, UserService};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Users
/// - `GET /user/all` - List all users
/// - `GET /user?id=N` - Get one user
/// - `POST /user/create` - Create a user and fetch their portfolio
/// - `PUT /user/edit?id=N` - Replace a user's details and refetch their portfolio
/// - `DELETE /user/delete?id=N` - Delete a user
///
/// ## System
/// - `GET /` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(service: UserService, config: Arc<Config>) -> Router {
    let state = AppState::new(service);

    let router = Router::new()
        // Users
        .route("/user/all", get(routes::list_users))
        .route("/user", get(routes::get_user))
        .route("/user/create", post(routes::create_user))
        .route("/user/edit", put(routes::edit_user))
        .route("/user/delete", delete(routes::delete_user))
        // System
        .route("/", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // SwaggerUi carries its own copy of the document
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on `config.api.bind_address` until `shutdown` resolves.
///
/// Shutdown is graceful: the listener stops accepting and in-flight requests
/// (including any portfolio fetches they started) run to completion.
///
/// # Example
///
/// ```no_run
/// use portfolio_feed::{Config, UserService};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let service = UserService::from_config(&config)?;
///
/// portfolio_feed::api::start_api_server(service, config, async {
///     tokio::signal::ctrl_c().await.ok();
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(service: UserService, config: Arc<Config>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
