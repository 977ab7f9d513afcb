//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the portfolio-feed REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the portfolio-feed REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "portfolio-feed REST API",
        version = "0.1.0",
        description = "User records whose stock portfolios are fetched concurrently from a quote service",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Users
        crate::api::routes::list_users,
        crate::api::routes::get_user,
        crate::api::routes::create_user,
        crate::api::routes::edit_user,
        crate::api::routes::delete_user,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::User,
        crate::types::UserUpdate,
        crate::types::StockData,
        crate::types::PricePoint,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "users", description = "Users - Create, edit and delete users; portfolios refresh on create and edit"),
        (name = "system", description = "System endpoints - Health check and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
