use std::fmt;

use sqlx::error::ErrorKind;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    /// A constraint enforced by the storage engine rejected the write
    IntegrityError(String),
    NotFound(String),
    Validation(String),
    SchemaError(Vec<String>),
    MigrationError(String),
    ConfigurationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IntegrityError(msg) => write!(f, "Integrity error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::SchemaError(errors) => {
                write!(f, "Schema validation failed: {}", errors.join("; "))
            }
            AppError::MigrationError(msg) => write!(f, "Migration error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => AppError::IntegrityError(db_err.message().to_string()),
                _ => AppError::DatabaseError(err.to_string()),
            },
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_schema_error_lists_every_problem() {
        let err = AppError::SchemaError(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Schema validation failed: a; b");
    }
}
