use crate::interceptor::{Interceptor, InterceptorResult, Next};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderValue, Request},
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs every request with its status and latency under a request-id span,
/// and echoes the id back in `x-request-id`.
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = tracing::info_span!("request", %method, %uri, request_id = %request_id);
        let start = Instant::now();

        async move {
            tracing::debug!("started");
            match next.run(request).await {
                Ok(mut response) => {
                    let status = response.status();
                    tracing::info!(status = status.as_u16(), elapsed = ?start.elapsed(), "finished");
                    if let Ok(value) = HeaderValue::from_str(&request_id) {
                        response.headers_mut().insert(REQUEST_ID_HEADER, value);
                    }
                    Ok(response)
                }
                Err(e) => {
                    tracing::error!(error = %e, elapsed = ?start.elapsed(), "failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
