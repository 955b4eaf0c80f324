//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Statement timeout for listing queries (default: 10s).
    pub statement_timeout: Duration,

    /// Upper bound for a page's `limit` (default: 100).
    pub max_page_size: u64,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Header carrying the tenant id (default: x-client-id).
    pub tenant_header: String,

    /// Apply embedded migrations on start (default: true).
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let statement_timeout_secs: u64 = env::var("STATEMENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("STATEMENT_TIMEOUT_SECS must be a valid u64")?;

        let max_page_size = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid u64")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let tenant_header = env::var("TENANT_HEADER")
            .unwrap_or_else(|_| "x-client-id".to_string())
            .to_lowercase();

        let run_migrations = env::var("RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("RUN_MIGRATIONS must be true or false")?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            statement_timeout: Duration::from_secs(statement_timeout_secs),
            max_page_size,
            cors_allowed_origins,
            tenant_header,
            run_migrations,
        })
    }

    /// Configuration for tests and tools that supply their own database URL.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            port: 3000,
            database_url: database_url.into(),
            database_max_connections: 5,
            statement_timeout: Duration::from_secs(10),
            max_page_size: 100,
            cors_allowed_origins: vec!["*".to_string()],
            tenant_header: "x-client-id".to_string(),
            run_migrations: true,
        }
    }
}
