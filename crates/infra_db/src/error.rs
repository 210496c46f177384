//! Database error types
//!
//! SQLx errors are classified by PostgreSQL SQLSTATE so that the record
//! store can report constraint failures as the matching [`PortError`].

use core_kernel::PortError;
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Row not found in database
    #[error("Row not found: {0}")]
    NotFound(String),

    /// Unique constraint violation (23505)
    #[error("Duplicate entry: {message}")]
    DuplicateEntry {
        constraint: Option<String>,
        /// Offending value, taken from the `Key (col)=(value)` detail
        value: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation (23503)
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        constraint: Option<String>,
        message: String,
    },

    /// Check constraint violation (23514)
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        constraint: Option<String>,
        message: String,
    },

    /// Exclusion constraint violation (23P01)
    #[error("Temporal overlap detected: {0}")]
    TemporalOverlap(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    /// A record could not be turned into column values
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a table and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("bill", "0190f3c2");
    /// assert!(error.to_string().contains("bill"));
    /// ```
    pub fn not_found(table: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", table, id))
    }

    /// Checks if this error indicates a row was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry { .. }
                | DatabaseError::ForeignKeyViolation { .. }
                | DatabaseError::ConstraintViolation { .. }
                | DatabaseError::TemporalOverlap(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// Name of the violated constraint, when PostgreSQL reported one
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DatabaseError::DuplicateEntry { constraint, .. }
            | DatabaseError::ForeignKeyViolation { constraint, .. }
            | DatabaseError::ConstraintViolation { constraint, .. } => constraint.as_deref(),
            _ => None,
        }
    }
}

/// Recovers the column from a default-named constraint
///
/// Migrations name constraints `<table>_<column>_<suffix>` (`_key`,
/// `_fkey`, `_check`), so `employee_user_id_key` on `employee` yields
/// `user_id`. Anything else is returned unchanged.
pub fn constraint_column<'a>(table: &str, constraint: &'a str) -> &'a str {
    let Some(rest) = constraint
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return constraint;
    };
    ["_fkey", "_key", "_check"]
        .iter()
        .find_map(|suffix| rest.strip_suffix(suffix))
        .unwrap_or(rest)
}

/// Pulls `value` out of a `Key (column)=(value) already exists.` detail
fn detail_value(detail: &str) -> Option<String> {
    let start = detail.find(")=(")? + 3;
    let end = detail[start..].find(')')? + start;
    Some(detail[start..end].to_string())
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let constraint = db_err.constraint().map(str::to_string);
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry {
                        constraint,
                        value: db_err
                            .try_downcast_ref::<PgDatabaseError>()
                            .and_then(PgDatabaseError::detail)
                            .and_then(detail_value),
                        message,
                    },
                    Some("23503") => DatabaseError::ForeignKeyViolation { constraint, message },
                    Some("23514") => DatabaseError::ConstraintViolation { constraint, message },
                    Some("23P01") => DatabaseError::TemporalOverlap(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::Migrate(err) => DatabaseError::MigrationFailed(*err),
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

/// Store-agnostic view of a database error
///
/// The record store refines foreign-key failures (missing reference on
/// write, protected row on delete) before falling back to this mapping.
impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "row".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry { constraint, value, message } => PortError::duplicate(
                "row",
                constraint.unwrap_or_default(),
                value.unwrap_or(message),
            ),
            DatabaseError::ForeignKeyViolation { constraint, message } => {
                PortError::missing_reference("row", constraint.unwrap_or_default(), message)
            }
            DatabaseError::ConstraintViolation { constraint, message } => PortError::Validation {
                message,
                field: constraint,
            },
            DatabaseError::TemporalOverlap(message) => PortError::Conflict { message },
            err @ (DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted) => {
                PortError::Connection {
                    message: err.to_string(),
                    source: Some(Box::new(err)),
                }
            }
            err => PortError::Internal {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_column_strips_table_and_suffix() {
        assert_eq!(constraint_column("employee", "employee_user_id_key"), "user_id");
        assert_eq!(constraint_column("address", "address_country_id_fkey"), "country_id");
        assert_eq!(constraint_column("company", "company_account_no_check"), "account_no");
    }

    #[test]
    fn test_constraint_column_keeps_foreign_names() {
        assert_eq!(constraint_column("bill", "custom_name"), "custom_name");
        assert_eq!(constraint_column("bill", "bill_period_window"), "period_window");
    }

    #[test]
    fn test_detail_value() {
        assert_eq!(
            detail_value("Key (number)=(1234567890) already exists."),
            Some("1234567890".to_string())
        );
        assert_eq!(detail_value("no key here"), None);
    }

    #[test]
    fn test_classification_helpers() {
        assert!(DatabaseError::not_found("bill", 1).is_not_found());
        assert!(DatabaseError::PoolExhausted.is_connection_error());
        let dup = DatabaseError::DuplicateEntry {
            constraint: Some("bill_number_key".into()),
            value: None,
            message: "duplicate".into(),
        };
        assert!(dup.is_constraint_violation());
        assert_eq!(dup.constraint(), Some("bill_number_key"));
    }

    #[test]
    fn test_pool_exhaustion_is_transient_port_error() {
        let err: PortError = DatabaseError::PoolExhausted.into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_check_violation_becomes_validation() {
        let err: PortError = DatabaseError::ConstraintViolation {
            constraint: Some("company_account_no_check".into()),
            message: "violates check".into(),
        }
        .into();
        assert!(matches!(err, PortError::Validation { field: Some(f), .. } if f == "company_account_no_check"));
    }
}
