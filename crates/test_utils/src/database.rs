//! Database Test Utilities
//!
//! Starts PostgreSQL in a container, applies the embedded migrations and
//! exposes [`PgPorts`], a single value serving the record ports of every
//! entity so graph-level helpers run unchanged against the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{
    DomainPort, EffectiveDated, EffectiveDatedPort, JournaledPort, PortError, RecordPort,
    RecordQuery,
};
use infra_db::{run_migrations, DatabaseConfig, PgRecordStore, PgTable};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "billing_test";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL container
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container and applies the migrations
    pub async fn new() -> Result<Self, BoxError> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool = infra_db::create_pool(
            DatabaseConfig::new(config.connection_url())
                .max_connections(5)
                .min_connections(1)
                .connect_timeout(Duration::from_secs(30)),
        )
        .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Record ports backed by this database
    pub fn ports(&self) -> PgPorts {
        PgPorts::new(self.pool.clone())
    }

    /// Removes every row while keeping the schema
    pub async fn clear_data(&self) -> Result<(), BoxError> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT tablename::text FROM pg_tables WHERE schemaname = 'public' AND tablename <> '_sqlx_migrations'",
        )
        .fetch_all(&self.pool)
        .await?;
        if !tables.is_empty() {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", tables.join(", ")))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or creates a shared test database instance
///
/// # Panics
///
/// Panics if the container cannot be started
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Creates an isolated test database for a single test
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}

/// Runs a test body against a fresh database
///
/// ```rust,ignore
/// db_test!(inserts_country, |ports| async move {
///     RecordPort::<Country>::insert(&ports, Country::new("GB", "+44")).await.unwrap();
/// });
/// ```
#[macro_export]
macro_rules! db_test {
    ($name:ident, $body:expr) => {
        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn $name() {
            let db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            ($body)(db.ports()).await;
        }
    };
}

/// One value serving the record ports of every mapped entity
///
/// Each call is delegated to a [`PgRecordStore`] for the entity.
#[derive(Debug, Clone)]
pub struct PgPorts {
    pool: PgPool,
}

impl PgPorts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn store<T: PgTable>(&self) -> PgRecordStore<T> {
        PgRecordStore::new(self.pool.clone())
    }
}

impl DomainPort for PgPorts {}

#[async_trait]
impl<T: PgTable> RecordPort<T> for PgPorts {
    async fn insert(&self, record: T) -> Result<T, PortError> {
        self.store::<T>().insert(record).await
    }

    async fn get(&self, id: T::Id) -> Result<T, PortError> {
        self.store::<T>().get(id).await
    }

    async fn find(&self, query: &RecordQuery) -> Result<Vec<T>, PortError> {
        self.store::<T>().find(query).await
    }

    async fn update(&self, record: T) -> Result<T, PortError> {
        self.store::<T>().update(record).await
    }

    async fn soft_delete(&self, id: T::Id) -> Result<T, PortError> {
        self.store::<T>().soft_delete(id).await
    }

    async fn delete(&self, id: T::Id) -> Result<(), PortError> {
        self.store::<T>().delete(id).await
    }

    async fn exists(&self, id: T::Id) -> Result<bool, PortError> {
        self.store::<T>().exists(id).await
    }
}

#[async_trait]
impl<T: PgTable, J: PgTable> JournaledPort<T, J> for PgPorts {
    async fn update_journaled(&self, record: T, entry: J) -> Result<(T, J), PortError> {
        self.store::<T>().update_journaled(record, entry).await
    }
}

#[async_trait]
impl<T: PgTable + EffectiveDated> EffectiveDatedPort<T> for PgPorts {
    async fn supersede(
        &self,
        id: T::Id,
        at: DateTime<Utc>,
        replacement: T,
    ) -> Result<(T, T), PortError> {
        self.store::<T>().supersede(id, at, replacement).await
    }
}
