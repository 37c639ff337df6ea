//! Shared application state for the API server.

use std::sync::Arc;
use std::time::SystemTime;

use crate::db::repository::Repository;

/// Shared application state for API handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Repository for database access.
    pub repository: Arc<Repository>,
    /// Application start time for uptime tracking.
    pub start_time: SystemTime,
}

impl AppState {
    /// Create a new AppState instance.
    #[must_use]
    pub fn new(repository: Repository) -> Self {
        Self {
            repository: Arc::new(repository),
            start_time: SystemTime::now(),
        }
    }
}
