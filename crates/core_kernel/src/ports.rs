//! Ports and Adapters Infrastructure
//!
//! Storage is reached only through port traits defined here. Each entity is
//! stored through a [`RecordPort`] for its type; effective-dated entities add
//! [`EffectiveDatedPort`] for superseding rows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain helpers                          │
//! │   (ContactVersion::current, ComponentGroup::components, ...) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               RecordPort<T> / EffectiveDatedPort<T>          │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴──────────┐
//!         │   PgRecordStore   │     │ InMemoryRecordStore│
//!         │    (infra_db)     │     │   (feature mock)   │
//!         └───────────────────┘     └────────────────────┘
//! ```
//!
//! Both adapters return the same [`PortError`] variants for the same
//! constraint violations, so code written against the ports behaves the
//! same in tests and against PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::identifiers::EntityId;
use crate::record::{EffectiveDated, Record};

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across the in-memory and database
/// adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested row was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A unique column already holds the value
    #[error("Duplicate {entity_type}.{field}: {value}")]
    Duplicate {
        entity_type: String,
        field: String,
        value: String,
    },

    /// A foreign key points at a row that does not exist
    #[error("Missing reference: {entity_type}.{field} -> {target}")]
    MissingReference {
        entity_type: String,
        field: String,
        target: String,
    },

    /// A protective foreign key blocks the delete
    #[error("Cannot delete {entity_type} {id}: {message}")]
    Protected {
        entity_type: String,
        id: String,
        message: String,
    },

    /// The row was changed since it was read
    #[error("Stale {entity_type} {id}: expected version {expected}, found {actual}")]
    StaleVersion {
        entity_type: String,
        id: String,
        expected: i32,
        actual: i32,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying store failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn duplicate(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        value: impl fmt::Display,
    ) -> Self {
        PortError::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn missing_reference(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        target: impl fmt::Display,
    ) -> Self {
        PortError::MissingReference {
            entity_type: entity_type.into(),
            field: field.into(),
            target: target.to_string(),
        }
    }

    pub fn protected(
        entity_type: impl Into<String>,
        id: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        PortError::Protected {
            entity_type: entity_type.into(),
            id: id.to_string(),
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    /// Returns true if this error indicates the row was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true for a unique violation on the named column
    pub fn is_duplicate_on(&self, column: &str) -> bool {
        matches!(self, PortError::Duplicate { field, .. } if field == column)
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Trait for adapters that support health checks
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

/// Restricts [`RecordPort::find`] to rows referencing one parent row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentFilter {
    /// Foreign-key column on the child table
    pub column: &'static str,
    pub id: Uuid,
}

/// Query parameters for listing rows
///
/// Results are always ordered by `order_no`, then id.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Include rows with `delete_fl` set
    pub include_deleted: bool,
    /// Keep only rows whose validity window contains this instant
    ///
    /// Ignored for entities without a validity window.
    pub effective_at: Option<DateTime<Utc>>,
    pub parent: Option<ParentFilter>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows whose `column` references the given parent
    pub fn children_of<I: EntityId>(column: &'static str, id: I) -> Self {
        Self {
            parent: Some(ParentFilter {
                column,
                id: id.uuid(),
            }),
            ..Default::default()
        }
    }

    pub fn effective_at(mut self, at: DateTime<Utc>) -> Self {
        self.effective_at = Some(at);
        self
    }

    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// Storage operations for one entity type
///
/// All methods are async and return `Result<_, PortError>` for consistent
/// error handling across adapters.
#[async_trait]
pub trait RecordPort<T: Record>: DomainPort {
    /// Stores a new row
    ///
    /// # Errors
    ///
    /// `Validation` when the row fails its rules, `Duplicate` when a unique
    /// column clashes, `MissingReference` when a foreign key points nowhere.
    async fn insert(&self, record: T) -> Result<T, PortError>;

    /// Retrieves a row by id, soft-deleted rows included
    async fn get(&self, id: T::Id) -> Result<T, PortError>;

    /// Lists rows matching the query
    async fn find(&self, query: &RecordQuery) -> Result<Vec<T>, PortError>;

    /// Writes a changed row
    ///
    /// The stored `version_no` must equal the record's, otherwise
    /// `StaleVersion` is returned. The stored row gets `version_no + 1`.
    async fn update(&self, record: T) -> Result<T, PortError>;

    /// Sets `delete_fl` on the row; it remains retrievable by id
    async fn soft_delete(&self, id: T::Id) -> Result<T, PortError>;

    /// Physically removes the row, applying the on-delete policy of every
    /// relation pointing at it
    ///
    /// # Errors
    ///
    /// `Protected` if any protective relation still references the row or
    /// one of its cascaded dependents.
    async fn delete(&self, id: T::Id) -> Result<(), PortError>;

    /// Checks if a row exists
    async fn exists(&self, id: T::Id) -> Result<bool, PortError>;
}

/// Operations on entities whose rows carry a validity window
#[async_trait]
pub trait EffectiveDatedPort<T: EffectiveDated>: RecordPort<T> {
    /// Replaces the row from `at` onwards
    ///
    /// Closes the current row's window at `at` and stores `replacement` with
    /// the window `[at, previous valid_until)`. Returns the closed row and
    /// the new one.
    ///
    /// # Errors
    ///
    /// `Conflict` if the current row is soft-deleted, `Validation` if `at`
    /// lies outside its window.
    async fn supersede(
        &self,
        id: T::Id,
        at: DateTime<Utc>,
        replacement: T,
    ) -> Result<(T, T), PortError>;
}

/// Writes a changed row together with a journal row describing the change
///
/// Both rows are stored or neither is. Used where a history table must
/// account for every change of its parent, such as payment method status
/// events.
#[async_trait]
pub trait JournaledPort<T: Record, J: Record>: DomainPort {
    /// Updates `record` under the same version rules as
    /// [`RecordPort::update`] and inserts `entry`
    async fn update_journaled(&self, record: T, entry: J) -> Result<(T, J), PortError>;
}

/// Extension trait for RecordPort with convenience methods
#[async_trait]
pub trait RecordPortExt<T: Record>: RecordPort<T> {
    /// Gets a row, mapping NotFound to `None`
    async fn get_optional(&self, id: T::Id) -> Result<Option<T>, PortError> {
        match self.get(id).await {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// All live rows
    async fn list(&self) -> Result<Vec<T>, PortError> {
        self.find(&RecordQuery::new()).await
    }

    /// Live rows referencing the given parent
    async fn children<I: EntityId>(&self, column: &'static str, parent: I) -> Result<Vec<T>, PortError> {
        self.find(&RecordQuery::children_of(column, parent)).await
    }
}

// Blanket implementation for all RecordPort implementors
impl<T: Record, P: RecordPort<T> + ?Sized> RecordPortExt<T> for P {}

/// Translates a window error into the port's validation error
pub(crate) fn window_error(err: crate::temporal::TemporalError) -> PortError {
    PortError::validation_field(err.to_string(), "from_dttm")
}

/// Closes `current` at `at` and fits `replacement` into the remainder of its window
///
/// Shared by adapters before they persist the pair.
pub fn split_window<T: EffectiveDated>(
    current: &mut T,
    at: DateTime<Utc>,
    replacement: &mut T,
) -> Result<(), PortError> {
    if current.meta().delete_fl {
        return Err(PortError::conflict(format!(
            "{} {} is deleted and cannot be superseded",
            T::entity(),
            current.id()
        )));
    }
    let successor = current.window().successor_at(at).map_err(window_error)?;
    current.validity_mut().close_at(at).map_err(window_error)?;
    *replacement.validity_mut() = successor;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("bill", "123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("bill"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_duplicate_matches_column() {
        let error = PortError::duplicate("employee", "number", 1_234_567_890);
        assert!(error.is_duplicate_on("number"));
        assert!(!error.is_duplicate_on("user_id"));
    }

    #[test]
    fn test_connection_is_transient() {
        assert!(PortError::connection("pool closed").is_transient());
        assert!(!PortError::validation("bad email").is_transient());
    }

    #[test]
    fn test_children_query() {
        let id = crate::identifiers::ContactId::new();
        let query = RecordQuery::children_of("contact_id", id).paginate(10, 0);
        assert_eq!(query.parent.map(|p| p.column), Some("contact_id"));
        assert_eq!(query.limit, Some(10));
        assert!(!query.include_deleted);
    }
}
