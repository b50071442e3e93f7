use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("User not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbErr> for RegistryError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => RegistryError::Conflict(detail),
            _ => RegistryError::Database(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for RegistryError {
    fn into_response(self) -> axum::response::Response {
        use crate::exception::{ExceptionFilter, HttpExceptionFilter};
        HttpExceptionFilter.catch(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_db_error_maps_to_database() {
        let err = RegistryError::from(DbErr::Custom("connection reset".to_string()));
        match err {
            RegistryError::Database(msg) => assert!(msg.contains("connection reset")),
            other => panic!("Expected Database variant, got {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(RegistryError::NotFound.to_string(), "User not found");
        assert_eq!(
            RegistryError::Conflict("email".to_string()).to_string(),
            "Conflict: email"
        );
    }
}
