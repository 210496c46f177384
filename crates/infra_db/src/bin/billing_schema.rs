//! Applies the billing schema to the configured database
//!
//! ```bash
//! BILLING__DATABASE__URL=postgres://billing@localhost/billing cargo run --bin billing-schema
//! ```
//!
//! Settings come from `config/billing.toml` and `BILLING__*` variables; a
//! `.env` file is read first when present.

use anyhow::Context;
use core_kernel::HealthCheckable;
use domain_accounts::Country;
use infra_db::{create_pool, run_migrations, BillingSettings, PgRecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = BillingSettings::load().context("loading settings")?;
    init_tracing(&settings.log.level, settings.log.json);

    tracing::info!(timezone = settings.timezone.0.name(), "Starting billing-schema");

    let pool = create_pool(settings.database.pool_config())
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("applying migrations")?;

    let health = PgRecordStore::<Country>::new(pool.clone()).health_check().await;
    if !health.is_healthy() {
        anyhow::bail!(
            "database unhealthy after migration: {}",
            health.message.unwrap_or_default()
        );
    }
    tracing::info!(latency_ms = health.latency_ms, "Schema ready");

    pool.close().await;
    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}
