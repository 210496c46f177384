//! PostgreSQL storage for the billing schema
//!
//! Provides the layered [`BillingSettings`], the connection pool with the
//! embedded migrations, and [`PgRecordStore`], the database implementation
//! of the record ports shared with the in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, BillingSettings, PgRecordStore};
//! use domain_accounts::Country;
//!
//! let settings = BillingSettings::load()?;
//! let pool = create_pool(settings.database.pool_config()).await?;
//! run_migrations(&pool).await?;
//! let countries: PgRecordStore<Country> = PgRecordStore::new(pool);
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod schema;
pub mod store;

pub use config::BillingSettings;
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
pub use schema::PgTable;
pub use store::PgRecordStore;
