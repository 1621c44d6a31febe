use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("uniqueness violated: {0}")]
    Uniqueness(String),

    #[error("referential integrity violated: {0}")]
    ReferentialIntegrity(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[source] DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration error: {0}")]
    Migration(String),
}

impl SchemaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: &str, id: i32) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<DieselError> for SchemaError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound("row".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Uniqueness(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ReferentialIntegrity(info.message().to_string())
            }
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err: SchemaError = DieselError::NotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_database_error_keeps_source() {
        use std::error::Error as _;

        let err: SchemaError = DieselError::RollbackTransaction.into();
        assert!(matches!(err, SchemaError::Database(_)));
        assert!(err.source().is_some());

        let chained = format!("{:#}", anyhow::Error::from(err));
        assert!(chained.contains("database error"));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = SchemaError::not_found("user", 7);
        assert_eq!(err.to_string(), "not found: user 7");
    }
}
