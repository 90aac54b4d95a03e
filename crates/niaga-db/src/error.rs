//! # Database Errors
//!
//! ```text
//!   sqlx::Error ───────┐
//!                      ├──► DbError ──► ApiError (status + envelope)
//!   CoreError ─────────┘      ▲
//!   (rule broken inside a     │ DbError::Core keeps the rule's own
//!    checkout transaction)    │ message; the transaction is dropped
//!                             │ uncommitted on the way out
//! ```

use niaga_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row (kode, username).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// e.g. a barang pointing at a supplier that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Stock, credit, limit or status rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Business-rule or validation failure, safe to show the kasir.
    pub fn is_business(&self) -> bool {
        matches!(self, DbError::Core(_))
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err).into()
    }
}

/// Column name out of `UNIQUE constraint failed: barang.kode`.
fn unique_column(message: &str) -> Option<&str> {
    let (_, target) = message.split_once("UNIQUE constraint failed: ")?;
    // Composite indexes list several `table.column` pairs.
    let first = target.split(',').next()?.trim();
    first.split_once('.').map(|(_, column)| column)
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if let Some(column) = unique_column(message) {
                    DbError::duplicate(column, "unknown")
                } else if message.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    }
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through() {
        let err: DbError = CoreError::EmptyCart.into();
        assert!(err.is_business());
        assert_eq!(err.to_string(), "Keranjang kosong");

        let err: DbError = ValidationError::Required {
            field: "nama".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Barang", "b-1");
        assert_eq!(err.to_string(), "Barang not found: b-1");
        assert!(!err.is_business());
    }

    #[test]
    fn test_unique_column_parsing() {
        assert_eq!(unique_column("UNIQUE constraint failed: barang.kode"), Some("kode"));
        assert_eq!(
            unique_column("UNIQUE constraint failed: stok.barang_id, stok.tanggal"),
            Some("barang_id")
        );
        assert_eq!(unique_column("FOREIGN KEY constraint failed"), None);
    }
}
