//! Error type for store operations

use samadhi_common::{Categorized, ErrorCategory};
use thiserror::Error;

use crate::credentials::CredentialsError;
use crate::validation::ValidationError;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Everything a store call can fail with
///
/// Database errors are passed through untouched; use
/// [`StoreError::is_unique_violation`] to recognise constraint failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("No {0} matched the query")]
    NoMatch(&'static str),

    #[error("Column '{column}' does not exist on table '{table}'")]
    UnknownColumn { table: &'static str, column: String },

    #[error("The database did not report an id for the new {0} row")]
    MissingInsertId(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True when the database rejected a write because of a unique index
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::Database(sqlx::Error::Database(db)) if db.is_unique_violation())
    }

    /// True when the database rejected a write because of a foreign key
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, StoreError::Database(sqlx::Error::Database(db)) if db.is_foreign_key_violation())
    }
}

impl Categorized for StoreError {
    fn category(&self) -> ErrorCategory {
        match self {
            StoreError::Credentials(_) => ErrorCategory::Configuration,
            StoreError::Validation(e) => e.category(),
            StoreError::UnknownColumn { .. } => ErrorCategory::Usage,
            StoreError::NotFound { .. }
            | StoreError::NoMatch(_)
            | StoreError::MissingInsertId(_)
            | StoreError::Database(_) => ErrorCategory::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = StoreError::from(ValidationError::MissingField {
            entity: "Sample",
            field: "path",
        });
        assert_eq!(err.category(), ErrorCategory::Usage);

        let err = StoreError::NotFound { entity: "Dataset", id: 4 };
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.to_string(), "Dataset #4 not found");
        assert!(!err.is_unique_violation());
    }
}
