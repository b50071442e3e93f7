use axum::response::Response;

use crate::error::RegistryError;

pub mod http;

pub use http::HttpExceptionFilter;

/// Turns an error raised while handling a request into a response.
///
/// Filters must always produce a valid response.
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, error: RegistryError) -> Response;
}
