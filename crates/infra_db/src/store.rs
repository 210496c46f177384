//! PostgreSQL record store
//!
//! [`PgRecordStore`] implements the record ports for any [`PgTable`]
//! entity. Referential integrity, uniqueness and CHECK constraints are left
//! to PostgreSQL; their SQLSTATE codes are translated back into
//! [`PortError`] variants carrying the entity and column. Rows are checked
//! with [`check_record`] before any SQL is sent, so rule violations surface
//! as the same `Validation` errors the in-memory store returns.
//!
//! ```rust,ignore
//! use infra_db::PgRecordStore;
//! use domain_energy::Bill;
//!
//! let bills: PgRecordStore<Bill> = PgRecordStore::new(pool.clone());
//! let stored = allocator.insert(&bills, bill).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{
    check_record, ports::split_window, AdapterHealth, DomainPort, EffectiveDated,
    EffectiveDatedPort, EntityId, HealthCheckResult, HealthCheckable, JournaledPort, PortError,
    RecordPort, RecordQuery,
};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{constraint_column, DatabaseError};
use crate::schema::{quote, PgTable, MANAGED_COLUMNS};

/// Stores one entity type in its PostgreSQL table
pub struct PgRecordStore<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgRecordStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<T> Clone for PgRecordStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> fmt::Debug for PgRecordStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgRecordStore")
            .field("entity", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: PgTable> PgRecordStore<T> {
    /// Translates a failed write into the port error for this entity
    fn write_error(err: DatabaseError) -> PortError {
        match err {
            DatabaseError::DuplicateEntry { constraint, value, message } => {
                let field = constraint
                    .as_deref()
                    .map(|name| constraint_column(T::table(), name))
                    .unwrap_or_default();
                PortError::duplicate(T::table(), field, value.unwrap_or(message))
            }
            DatabaseError::ForeignKeyViolation { constraint, message } => {
                let field = constraint
                    .as_deref()
                    .map(|name| constraint_column(T::table(), name))
                    .unwrap_or_default();
                PortError::missing_reference(T::table(), field, message)
            }
            DatabaseError::ConstraintViolation { constraint: Some(name), message } => {
                PortError::validation_field(message, constraint_column(T::table(), &name))
            }
            other => other.into(),
        }
    }

    fn read_error(err: sqlx::Error) -> PortError {
        DatabaseError::from(err).into()
    }

    async fn insert_row<'e, E>(executor: E, record: &T) -> Result<T, PortError>
    where
        E: PgExecutor<'e>,
    {
        check_record(record)?;
        let columns = record.columns().map_err(PortError::from)?;
        let names = column_list(columns.keys().map(String::as_str));
        let table = quote(T::table());

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
        builder
            .push(&table)
            .push(" (")
            .push(&names)
            .push(") SELECT ")
            .push(&names)
            .push(" FROM jsonb_populate_record(NULL::")
            .push(&table)
            .push(", ")
            .push_bind(Json(columns))
            .push(") RETURNING *");

        builder
            .build_query_as::<T>()
            .fetch_one(executor)
            .await
            .map_err(|err| Self::write_error(err.into()))
    }

    /// Writes every column of `record` if its version is still current
    ///
    /// Returns `None` when no row with that id and version exists.
    async fn update_row<'e, E>(executor: E, record: &T) -> Result<Option<T>, PortError>
    where
        E: PgExecutor<'e>,
    {
        check_record(record)?;
        let mut columns: Map<String, Value> = record.columns().map_err(PortError::from)?;
        columns.retain(|name, _| !MANAGED_COLUMNS.contains(&name.as_str()));

        let table = quote(T::table());
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder.push(&table).push(" AS target SET ");
        for name in columns.keys() {
            let column = quote(name);
            builder.push(format!("{column} = source.{column}, "));
        }
        builder
            .push("version_no = target.version_no + 1 FROM jsonb_populate_record(NULL::")
            .push(&table)
            .push(", ")
            .push_bind(Json(columns))
            .push(") AS source WHERE target.id = ")
            .push_bind(record.id().uuid())
            .push(" AND target.version_no = ")
            .push_bind(record.meta().version_no)
            .push(" RETURNING target.*");

        builder
            .build_query_as::<T>()
            .fetch_optional(executor)
            .await
            .map_err(|err| Self::write_error(err.into()))
    }

    /// Explains why an update matched no row
    async fn missed_update(&self, record: &T) -> PortError {
        let id = record.id();
        match self.fetch_version(id.uuid()).await {
            Ok(Some(actual)) => PortError::StaleVersion {
                entity_type: T::table().to_string(),
                id: id.to_string(),
                expected: record.meta().version_no,
                actual,
            },
            Ok(None) => PortError::not_found(T::table(), id),
            Err(err) => err,
        }
    }

    async fn fetch_version(&self, id: Uuid) -> Result<Option<i32>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT version_no FROM ");
        builder.push(quote(T::table())).push(" WHERE id = ").push_bind(id);
        builder
            .build_query_scalar::<i32>()
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::read_error)
    }
}

fn column_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote).collect::<Vec<_>>().join(", ")
}

impl<T: PgTable> DomainPort for PgRecordStore<T> {}

#[async_trait]
impl<T: PgTable> HealthCheckable for PgRecordStore<T> {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: format!("postgres-{}", T::table()),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl<T: PgTable> RecordPort<T> for PgRecordStore<T> {
    #[instrument(skip_all, fields(entity = T::table(), id = %record.id()))]
    async fn insert(&self, record: T) -> Result<T, PortError> {
        let stored = Self::insert_row(&self.pool, &record).await?;
        debug!("Inserted record");
        Ok(stored)
    }

    #[instrument(skip(self), fields(entity = T::table()))]
    async fn get(&self, id: T::Id) -> Result<T, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        builder.push(quote(T::table())).push(" WHERE id = ").push_bind(id.uuid());
        builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::read_error)?
            .ok_or_else(|| PortError::not_found(T::table(), id))
    }

    #[instrument(skip(self), fields(entity = T::table()))]
    async fn find(&self, query: &RecordQuery) -> Result<Vec<T>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        builder.push(quote(T::table())).push(" WHERE TRUE");

        if !query.include_deleted {
            builder.push(" AND delete_fl = FALSE");
        }
        if let Some(parent) = query.parent {
            builder
                .push(" AND ")
                .push(quote(parent.column))
                .push(" = ")
                .push_bind(parent.id);
        }
        if let (true, Some(at)) = (T::EFFECTIVE_DATED, query.effective_at) {
            builder
                .push(" AND from_dttm <= ")
                .push_bind(at)
                .push(" AND to_dttm > ")
                .push_bind(at);
        }
        builder.push(" ORDER BY order_no, id");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ").push_bind(i64::from(offset));
        }

        let rows = builder
            .build_query_as::<T>()
            .fetch_all(&self.pool)
            .await
            .map_err(Self::read_error)?;
        debug!(count = rows.len(), "Found records");
        Ok(rows)
    }

    #[instrument(skip_all, fields(entity = T::table(), id = %record.id()))]
    async fn update(&self, record: T) -> Result<T, PortError> {
        match Self::update_row(&self.pool, &record).await? {
            Some(row) => {
                debug!(version = row.meta().version_no, "Updated record");
                Ok(row)
            }
            None => Err(self.missed_update(&record).await),
        }
    }

    #[instrument(skip(self), fields(entity = T::table()))]
    async fn soft_delete(&self, id: T::Id) -> Result<T, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder
            .push(quote(T::table()))
            .push(" SET delete_fl = TRUE, version_no = version_no + 1 WHERE id = ")
            .push_bind(id.uuid())
            .push(" RETURNING *");
        let row = builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::read_error)?
            .ok_or_else(|| PortError::not_found(T::table(), id))?;
        debug!("Soft-deleted record");
        Ok(row)
    }

    #[instrument(skip(self), fields(entity = T::table()))]
    async fn delete(&self, id: T::Id) -> Result<(), PortError> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder.push(quote(T::table())).push(" WHERE id = ").push_bind(id.uuid());

        let result = builder.build().execute(&self.pool).await;
        match result.map_err(DatabaseError::from) {
            Ok(done) if done.rows_affected() == 0 => Err(PortError::not_found(T::table(), id)),
            Ok(_) => {
                debug!("Deleted record");
                Ok(())
            }
            Err(DatabaseError::ForeignKeyViolation { constraint, message }) => {
                warn!(constraint = constraint.as_deref(), "Delete blocked by a protective reference");
                Err(PortError::protected(T::table(), id, message))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, id: T::Id) -> Result<bool, PortError> {
        Ok(self.fetch_version(id.uuid()).await?.is_some())
    }
}

#[async_trait]
impl<T: PgTable, J: PgTable> JournaledPort<T, J> for PgRecordStore<T> {
    #[instrument(skip_all, fields(entity = T::table(), id = %record.id(), journal = J::table()))]
    async fn update_journaled(&self, record: T, entry: J) -> Result<(T, J), PortError> {
        let mut tx = self.pool.begin().await.map_err(Self::read_error)?;

        let Some(updated) = Self::update_row(&mut *tx, &record).await? else {
            tx.rollback().await.map_err(Self::read_error)?;
            return Err(self.missed_update(&record).await);
        };
        let inserted = PgRecordStore::<J>::insert_row(&mut *tx, &entry).await?;
        tx.commit().await.map_err(Self::read_error)?;

        debug!(version = updated.meta().version_no, "Updated record with journal entry");
        Ok((updated, inserted))
    }
}

#[async_trait]
impl<T: PgTable + EffectiveDated> EffectiveDatedPort<T> for PgRecordStore<T> {
    #[instrument(skip(self, replacement), fields(entity = T::table()))]
    async fn supersede(
        &self,
        id: T::Id,
        at: DateTime<Utc>,
        mut replacement: T,
    ) -> Result<(T, T), PortError> {
        let mut tx = self.pool.begin().await.map_err(Self::read_error)?;
        let table = quote(T::table());

        let mut lock = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        lock.push(&table)
            .push(" WHERE id = ")
            .push_bind(id.uuid())
            .push(" FOR UPDATE");
        let mut current = lock
            .build_query_as::<T>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(Self::read_error)?
            .ok_or_else(|| PortError::not_found(T::table(), id))?;

        split_window(&mut current, at, &mut replacement)?;

        let mut close = QueryBuilder::<Postgres>::new("UPDATE ");
        close
            .push(&table)
            .push(" SET to_dttm = ")
            .push_bind(current.window().valid_until)
            .push(", version_no = version_no + 1 WHERE id = ")
            .push_bind(id.uuid())
            .push(" RETURNING *");
        let closed = close
            .build_query_as::<T>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| Self::write_error(err.into()))?;

        let inserted = Self::insert_row(&mut *tx, &replacement).await?;
        tx.commit().await.map_err(Self::read_error)?;

        debug!(replacement = %inserted.id(), "Superseded record");
        Ok((closed, inserted))
    }
}
