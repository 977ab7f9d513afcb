//! Application state for the API server

use crate::UserService;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; the service itself is a set of shared handles.
#[derive(Clone, Debug)]
pub struct AppState {
    /// User operations, including portfolio refresh
    pub service: UserService,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: UserService) -> Self {
        Self { service }
    }
}
