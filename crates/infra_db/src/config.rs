//! Layered settings
//!
//! Built-in defaults, then an optional `config/billing.toml`, then
//! environment variables prefixed `BILLING__` with `__` between sections:
//!
//! ```text
//! BILLING__DATABASE__URL=postgres://billing@db/billing
//! BILLING__LOG__JSON=true
//! BILLING__TIMEZONE=Europe/Dublin
//! ```

use config::{Config, ConfigError, Environment, File};
use core_kernel::{EffectiveDated, NumberAllocator, Timezone};
use serde::Deserialize;
use std::time::Duration;

use crate::pool::DatabaseConfig;

/// Default location of the optional settings file
pub const CONFIG_FILE: &str = "config/billing";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl DatabaseSettings {
    /// Pool options for these settings
    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.url)
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceNumberSettings {
    /// Draws per insert before a duplicate number is reported
    pub max_attempts: u32,
}

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct BillingSettings {
    pub database: DatabaseSettings,
    pub log: LogSettings,
    /// Zone whose midnight starts "today" for default validity windows
    pub timezone: Timezone,
    pub reference_numbers: ReferenceNumberSettings,
}

impl BillingSettings {
    /// Loads settings from `config/billing.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Loads settings using the given file stem instead of the default one
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("BILLING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "postgres://localhost/billing")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .set_default("timezone", "Europe/London")?
            .set_default("reference_numbers.max_attempts", 5)
    }

    /// Reference-number allocator honouring the configured retry budget
    pub fn allocator(&self) -> NumberAllocator {
        NumberAllocator::new(self.reference_numbers.max_attempts)
    }

    /// Opens `record`'s window at midnight today in the configured zone
    ///
    /// Constructors default to a UTC midnight; rows created on behalf of
    /// users should pass through here so "today" follows local time.
    pub fn effective_today<T: EffectiveDated>(&self, record: T) -> T {
        record.effective_today(&self.timezone)
    }
}
