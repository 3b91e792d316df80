//! Connection pool and schema migrations

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// Pool sizing and the target database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free connection before `PoolExhausted`
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
        }
    }

    fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(DatabaseError::ConnectionFailed(format!(
                "invalid pool bounds: min {} / max {}",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/reimbursement")
    }
}

/// Opens a pool with the given bounds
///
/// Fails fast on inverted bounds instead of letting sqlx panic at runtime.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    config.check()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Database pool ready"
    );
    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
///
/// Already-applied migrations are skipped, so this runs on every startup.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url, "postgres://localhost/reimbursement");
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_inverted_bounds_are_refused() {
        let config = DatabaseConfig {
            min_connections: 8,
            max_connections: 4,
            ..DatabaseConfig::default()
        };
        assert!(matches!(config.check(), Err(DatabaseError::ConnectionFailed(_))));

        let empty = DatabaseConfig {
            max_connections: 0,
            min_connections: 0,
            ..DatabaseConfig::default()
        };
        assert!(empty.check().is_err());
    }
}
