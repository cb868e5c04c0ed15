//! Application state shared across handlers

use std::sync::Arc;
use wordcard_auth::AuthService;
use wordcard_db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: Database,
    /// Authentication service
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Create a new application state
    pub fn new(db: Database, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }
}
