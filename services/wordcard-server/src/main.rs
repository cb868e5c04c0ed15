//! wordcard API Server
//!
//! REST server for personal vocabulary cards behind JWT sessions.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! wordcard-server --dev-mode
//!
//! # Start with custom config
//! wordcard-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! WORDCARD__SERVER__PORT=9000 JWT_SECRET=... wordcard-server
//! ```

mod config;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wordcard_api::{create_router, ApiConfig, AppState};
use wordcard_auth::AuthService;
use wordcard_db::Database;

use crate::config::{DatabaseSettings, LoggingConfig, ServerConfig};

/// Secret used when `--dev-mode` runs without one configured
const DEV_JWT_SECRET: &str = "wordcard-development-secret-do-not-deploy";

// =============================================================================
// CLI Arguments
// =============================================================================

/// wordcard API Server - vocabulary cards with JWT sessions
#[derive(Parser, Debug)]
#[command(name = "wordcard-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "WORDCARD_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "WORDCARD_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WORDCARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "WORDCARD_LOG_FORMAT")]
    log_format: Option<String>,

    /// SQLite connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JWT secret key
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Enable development mode (relaxed security)
    #[arg(long, env = "WORDCARD_DEV_MODE")]
    dev_mode: bool,
}

impl Args {
    /// Apply CLI overrides on top of the loaded configuration
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db_url) = self.database_url {
            config.database.url = db_url;
        }
        if let Some(jwt_secret) = self.jwt_secret {
            config.auth.jwt.secret = jwt_secret;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dev_mode = args.dev_mode;

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    server_config.auth = server_config
        .auth
        .with_env_overrides()
        .map_err(anyhow::Error::msg)?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting wordcard server"
    );

    validate_config(&mut server_config, dev_mode)?;

    let db = init_database(&server_config.database).await?;
    let auth = init_auth(&server_config, &db);

    let state = Arc::new(AppState::new(db, auth));

    let api_config = ApiConfig {
        enable_cors: server_config.api.enable_cors,
        cors_origins: server_config.api.cors_origins.clone(),
        enable_tracing: server_config.api.enable_tracing,
    };

    let app = create_router(state, api_config);

    let addr = server_config.server.socket_addr()?;

    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Validate configuration
///
/// Outside dev mode a missing or placeholder signing secret is fatal, as is
/// any problem reported by the auth configuration. Dev mode downgrades these
/// to warnings and fills in a throwaway secret.
fn validate_config(config: &mut ServerConfig, dev_mode: bool) -> anyhow::Result<()> {
    if config.uses_placeholder_secret() {
        if !dev_mode {
            anyhow::bail!(
                "JWT secret must be changed in production. Set JWT_SECRET environment variable."
            );
        }
        tracing::warn!("No JWT secret configured, using the development secret");
        config.auth.jwt.secret = DEV_JWT_SECRET.to_string();
    }

    if let Err(errors) = config.auth.validate() {
        if !dev_mode {
            anyhow::bail!("Invalid auth configuration: {}", errors.join("; "));
        }
        for error in errors {
            tracing::warn!(%error, "Auth configuration problem");
        }
    }

    if !config.auth.session.allow_implicit_registration {
        tracing::info!("Implicit registration on login is disabled");
    }

    Ok(())
}

/// Initialize database connection
async fn init_database(config: &DatabaseSettings) -> anyhow::Result<Database> {
    tracing::info!("Connecting to database...");

    let db = Database::connect(&config.to_db_config()).await?;

    if config.run_migrations {
        db.migrate().await?;
    }

    let health = db.health_check().await;
    if !health.healthy {
        anyhow::bail!("Database health check failed");
    }

    tracing::info!(sqlite = health.sqlite, "Database health check passed");

    Ok(db)
}

/// Initialize authentication service
fn init_auth(config: &ServerConfig, db: &Database) -> Arc<AuthService> {
    tracing::info!(
        access_ttl_secs = config.auth.jwt.access_token_lifetime.as_secs(),
        refresh_ttl_secs = config.auth.jwt.refresh_token_lifetime.as_secs(),
        "Initializing authentication service..."
    );

    Arc::new(AuthService::new(db, config.auth.clone()))
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
