use std::str::FromStr;
use std::time::Duration;

use guestbook_core::storage::{RepositoryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::{DatabaseConfig, PoolConfig};

use super::schema;

/// Primary (read-write) and replica (read-only) connection pools.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pub master: SqlitePool,
    pub slave: SqlitePool,
    pub slow_query: Duration,
}

async fn connect_pool(config: &PoolConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.dsn)
        .map_err(|e| RepositoryError::ConnectionFailed(format!("invalid DSN: {e}")))?;

    SqlitePoolOptions::new()
        .max_connections(config.max_open_connections)
        .idle_timeout(Some(config.max_idle_time()))
        .max_lifetime(Some(config.max_lifetime()))
        .connect_with(options)
        .await
        .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
}

impl SqliteDatabase {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let master = connect_pool(&config.master).await?;
        let slave = if config.slave == config.master {
            master.clone()
        } else {
            connect_pool(&config.slave).await?
        };

        tracing::info!(
            master = %config.master.dsn,
            slave = %config.slave.dsn,
            "Connected to database"
        );

        Ok(Self {
            master,
            slave,
            slow_query: config.max_query_duration_warning(),
        })
    }

    /// A migrated in-memory database whose primary and replica are the same
    /// single connection.
    #[cfg(test)]
    pub async fn in_memory(slow_query: Duration) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            master: pool.clone(),
            slave: pool,
            slow_query,
        };
        db.migrate().await?;
        Ok(db)
    }

    /// Creates the tables and indexes on the primary.
    pub async fn migrate(&self) -> Result<()> {
        for statement in schema::MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.master)
                .await
                .map_err(|e| RepositoryError::QueryFailed(format!("migration failed: {e}")))?;
        }
        Ok(())
    }
}
