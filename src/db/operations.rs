use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use sqlx::migrate::Migrator;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{AppError, DatabaseError};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Shared handle to the relational store.
///
/// Backed by the sqlx `Any` driver so the same code talks to PostgreSQL in
/// deployment and SQLite locally.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        sqlx::any::install_default_drivers();

        // Every connection to an in-memory SQLite database sees its own
        // empty database, so the pool must hold exactly one, forever.
        let in_memory = config.url.contains(":memory:");
        let mut options = AnyPoolOptions::new()
            .max_connections(if in_memory { 1 } else { config.max_connections })
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(DatabaseError::ConnectionError(e.to_string())))?;

        debug!("Connected to database (in_memory: {})", in_memory);
        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn pool_status(&self) -> DbPoolStatus {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DbPoolStatus {
            total_connections: size,
            active_connections: size.saturating_sub(idle),
            idle_connections: idle,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Clone)]
pub struct DbPoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}

#[cfg(test)]
pub(crate) async fn memory_database() -> Database {
    let db = Database::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 4,
        acquire_timeout_secs: 5,
    })
    .await
    .expect("Failed to open in-memory database");
    db.migrate().await.expect("Failed to run migrations");
    db
}
