//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                    • constraint family (unique / foreign key)   │
//! │       │                    • initialization failures (fatal)            │
//! │       │                    • everything else is a storage failure       │
//! │       ▼                                                                 │
//! │  Operation boundary: logged with tracing, then returned                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Screen decides what to show ("username already taken", retry...)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cellar_core::ValidationError;
use thiserror::Error;

/// Database operation errors.
///
/// `UniqueViolation` and `ForeignKeyViolation` form the constraint family;
/// callers test for it with [`DbError::is_constraint_violation`].
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Update or delete addressed an id with no row
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Registering a username that already exists
    /// - Renaming a user onto an existing username
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Product pointing at a non-existent category
    /// - Order for a non-existent user
    /// - Order item for a non-existent product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created or opened
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema creation, migration or seeding failed.
    ///
    /// Fatal: no `Database` handle is produced and nothing may be served.
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to begin or commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (the single connection stayed busy past the timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Input rejected before any SQL ran.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Credential hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for unique and foreign-key violations.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. }
        )
    }

    /// Re-labels a failure raised while preparing the schema.
    pub(crate) fn into_initialization(self) -> Self {
        match self {
            DbError::InitializationFailed(_) => self,
            other => DbError::InitializationFailed(other.to_string()),
        }
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

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Turns "no row matched" into `NotFound` for updates and deletes.
pub(crate) fn require_affected(rows_affected: u64, entity: &str, id: i64) -> DbResult<()> {
    if rows_affected == 0 {
        return Err(DbError::not_found(entity, id));
    }
    Ok(())
}

/// Logs failures at an operation boundary before they reach the caller.
pub(crate) trait LogFailure {
    fn log_failure(self, operation: &'static str) -> Self;
}

impl<T> LogFailure for DbResult<T> {
    fn log_failure(self, operation: &'static str) -> Self {
        if let Err(err) = &self {
            tracing::error!(operation, error = %err, "Database operation failed");
        }
        self
    }
}
