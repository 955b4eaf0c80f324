//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::filter::{CatalogRegistry, PaginatedQueryExecutor};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,
    /// Catalogs of every listable entity.
    catalogs: CatalogRegistry,
    /// Runs count and page queries.
    executor: PaginatedQueryExecutor,
    /// Upper bound for a page's `limit`.
    max_page_size: u64,
    /// Lower-cased header name carrying the tenant id.
    tenant_header: String,
}

impl AppState {
    /// Connect to PostgreSQL and build the state.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        if config.run_migrations {
            db::run_migrations(&db)
                .await
                .context("failed to run migrations")?;
        }

        Ok(Self::from_pool(db, config))
    }

    /// Build the state around an existing pool.
    pub fn from_pool(db: PgPool, config: &Config) -> Self {
        let executor = PaginatedQueryExecutor::new(db.clone(), config.statement_timeout);
        let catalogs = CatalogRegistry::default();

        tracing::debug!(entities = ?catalogs.entities(), "entity catalogs registered");

        Self {
            inner: Arc::new(AppStateInner {
                db,
                catalogs,
                executor,
                max_page_size: config.max_page_size,
                tenant_header: config.tenant_header.to_lowercase(),
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub fn catalogs(&self) -> &CatalogRegistry {
        &self.inner.catalogs
    }

    pub fn executor(&self) -> &PaginatedQueryExecutor {
        &self.inner.executor
    }

    pub fn max_page_size(&self) -> u64 {
        self.inner.max_page_size
    }

    pub fn tenant_header(&self) -> &str {
        &self.inner.tenant_header
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
