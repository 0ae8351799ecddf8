//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Domain Error (CoreError)          │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ◄──────────────────┘                             │
//! │       │          Adds context; keeps caller errors (NotFound,          │
//! │       │          Validation, InvalidTransition) distinct from faults   │
//! │       ▼                                                                 │
//! │  External API layer maps kinds to responses; faults become a           │
//! │  generic server error and roll back any in-flight transaction          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use paperback_core::CoreError;

/// Database operation errors.
///
/// These errors wrap sqlx errors and carry domain errors through the
/// repository API, so every repository method returns one `DbResult<T>`.
#[derive(Debug, Error)]
pub enum DbError {
    /// Recoverable domain error (not found, validation, bad transition).
    ///
    /// These are caller-facing and never treated as faults.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `rows_affected == 0` on a guarded UPDATE/DELETE
    /// - ID doesn't exist or row is soft-deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second cart for the same user
    /// - Second current offer for the same book
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when the error is recoverable and caller-facing, as opposed
    /// to a storage fault the API layer should surface generically.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, DbError::Domain(_) | DbError::NotFound { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<paperback_core::ValidationError> for DbError {
    fn from(err: paperback_core::ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use paperback_core::ValidationError;

    #[test]
    fn test_caller_error_classification() {
        let err: DbError = CoreError::BookNotFound("b1".to_string()).into();
        assert!(err.is_caller_error());

        let err: DbError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(err.is_caller_error());

        assert!(!DbError::PoolExhausted.is_caller_error());
        assert!(!DbError::Internal("boom".to_string()).is_caller_error());
    }
}
