//! Database configuration

use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (`sqlite://wordcard.db`, `sqlite::memory:`)
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,
    /// Create the database file when it does not exist yet
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://wordcard.db".to_string()),
            max_connections: 10,
            acquire_timeout_secs: 30,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// Mask credentials in the URL for logging
    pub fn url_masked(&self) -> String {
        mask_url(&self.url)
    }
}

fn mask_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        if at_pos > scheme_end {
            let user_pass = &url[scheme_end + 3..at_pos];
            if let Some(colon_pos) = user_pass.find(':') {
                let user = &user_pass[..colon_pos];
                return format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at_pos..]);
            }
        }
    }
    url.to_string()
}
