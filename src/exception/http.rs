use crate::error::RegistryError;
use crate::exception::ExceptionFilter;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Default filter: 404 with an empty body for missing users, a JSON error
/// body for everything else.
#[derive(Default, Clone, Copy)]
pub struct HttpExceptionFilter;

impl HttpExceptionFilter {
    pub fn status_of(error: &RegistryError) -> StatusCode {
        match error {
            RegistryError::NotFound => StatusCode::NOT_FOUND,
            RegistryError::Conflict(_) => StatusCode::CONFLICT,
            RegistryError::Database(_)
            | RegistryError::Transaction(_)
            | RegistryError::Schema(_)
            | RegistryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: RegistryError) -> Response {
        let status = Self::status_of(&error);

        if status == StatusCode::NOT_FOUND {
            return status.into_response();
        }

        if status.is_server_error() {
            tracing::error!(error = %error, "request failed");
        } else {
            tracing::debug!(error = %error, "request rejected");
        }

        // Storage details stay in the log.
        let message = match &error {
            RegistryError::Conflict(_) => "A user with this email already exists".to_string(),
            _ => "Internal Server Error".to_string(),
        };

        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}
