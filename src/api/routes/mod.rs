//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`users`]: user CRUD and portfolio refresh
//! - [`system`]: health and OpenAPI

use serde::{Deserialize, Serialize};

mod system;
mod users;

pub use system::*;
pub use users::*;

/// Query parameters selecting one user (`?id=N`)
#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    /// User id
    pub id: i64,
}
