//! Connection pool and migrations for the billing schema
//!
//! One `PgPool` is shared by every `PgRecordStore`; the stores are cheap
//! handles over it. Migrations live in the workspace `migrations/`
//! directory and are compiled into the binary, so `billing-schema` can
//! bring an empty database up to date without the source tree.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// Schema migrations embedded at compile time from the workspace `migrations/`
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Pool options for the billing database
///
/// Defaults suit a single back-office service; batch jobs that fan out
/// over many accounts usually raise `max_connections`.
///
/// # Example
///
/// ```rust
/// use infra_db::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("postgres://localhost/billing")
///     .max_connections(20)
///     .connect_timeout(Duration::from_secs(10));
/// assert_eq!(config.max_connections, 20);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `postgres://billing@db/billing`
    pub url: String,
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long `acquire` waits before giving up
    pub connect_timeout: Duration,
    /// Age after which a connection is recycled
    pub max_lifetime: Duration,
    /// Idle time after which a connection above the minimum is closed
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    /// Options for `url` with the service defaults
    ///
    /// # Arguments
    ///
    /// * `url` - PostgreSQL connection string for the billing database
    ///
    /// # Returns
    ///
    /// A config with 2..=10 connections, a 30s acquire timeout, 30 min
    /// lifetime and 10 min idle timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }

    /// Sets the pool's connection ceiling
    ///
    /// # Arguments
    ///
    /// * `max` - Maximum open connections (default: 10)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets how many connections stay open when idle
    ///
    /// # Arguments
    ///
    /// * `min` - Minimum open connections (default: 2)
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets how long to wait for a free connection
    ///
    /// # Arguments
    ///
    /// * `timeout` - Acquire timeout (default: 30s)
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the age at which connections are recycled
    ///
    /// # Arguments
    ///
    /// * `lifetime` - Maximum connection age (default: 30 min)
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Sets how long a surplus connection may sit idle
    ///
    /// # Arguments
    ///
    /// * `timeout` - Idle time before closing (default: 10 min)
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/billing")
    }
}

/// Opens the billing database pool
///
/// Connects eagerly, so a bad URL or unreachable server is reported here
/// rather than on the first query.
///
/// # Arguments
///
/// * `config` - Pool options, usually from `BillingSettings::database`
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if the pool cannot be created
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Database pool created");
    Ok(pool)
}

/// Opens a pool for `url` with the default options
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if the server cannot be reached
pub async fn create_pool_from_url(url: &str) -> Result<DatabasePool, DatabaseError> {
    create_pool(DatabaseConfig::new(url)).await
}

/// Brings the billing schema up to date
///
/// Applies every embedded migration not yet recorded in
/// `_sqlx_migrations`. Already-applied migrations are skipped, so this is
/// safe to run at every start.
///
/// # Errors
///
/// Returns `DatabaseError::MigrationFailed` if a script fails or an applied
/// migration no longer matches its checksum
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    info!(count = MIGRATOR.iter().count(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!("Migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("postgres://test")
            .max_connections(50)
            .min_connections(10)
            .connect_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 10);
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_default_options() {
        let config = DatabaseConfig::default();
        assert_eq!((config.min_connections, config.max_connections), (2, 10));
        assert_eq!(config.max_lifetime, Duration::from_secs(1800));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_migrations_are_embedded() {
        assert!(MIGRATOR.iter().any(|m| m.description.contains("schema")));
    }
}
