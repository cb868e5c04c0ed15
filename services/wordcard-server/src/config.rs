//! Server Configuration
//!
//! Layered configuration for the wordcard server: optional config file,
//! `config/default` and `config/local`, then `WORDCARD__`-prefixed
//! environment variables (`__` separates sections). CLI flags are applied
//! on top by `main`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use wordcard_auth::AuthConfig;
use wordcard_db::DatabaseConfig;

/// Signing secret shipped in defaults; refused outside dev mode
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server binding configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Authentication configuration
    #[serde(default = "default_auth")]
    pub auth: AuthConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: true,
        }
    }
}

impl DatabaseSettings {
    pub fn to_db_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            acquire_timeout_secs: self.connect_timeout_secs,
            create_if_missing: true,
        }
    }
}

/// API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable request tracing
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: default_cors_origins(),
            enable_tracing: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_auth() -> AuthConfig {
    let mut auth = AuthConfig::default();
    auth.jwt.secret = PLACEHOLDER_JWT_SECRET.to_string();
    auth
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://wordcard.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // WORDCARD__SERVER__PORT=9000, WORDCARD__AUTH__JWT__SECRET=...
        builder = builder.add_source(
            config::Environment::with_prefix("WORDCARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let server_config: ServerConfig = builder.build()?.try_deserialize()?;

        Ok(server_config)
    }

    /// Create a configuration for development/testing
    pub fn development() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: default_auth(),
            api: ApiSettings::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    /// Whether the signing secret was never configured
    pub fn uses_placeholder_secret(&self) -> bool {
        self.auth.jwt.secret.is_empty() || self.auth.jwt.secret == PLACEHOLDER_JWT_SECRET
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            ..Self::development()
        }
    }
}
