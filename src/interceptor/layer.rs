use crate::interceptor::{Interceptor, InterceptorResult, Next};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer running a chain of interceptors around the inner service.
///
/// The first interceptor is the outermost.
#[derive(Clone)]
pub struct InterceptorLayer {
    interceptors: Arc<Vec<Arc<dyn Interceptor>>>,
}

impl InterceptorLayer {
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptors: Arc::new(interceptors),
        }
    }
}

impl<S> Layer<S> for InterceptorLayer {
    type Service = InterceptorMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptorMiddleware {
            inner,
            interceptors: Arc::clone(&self.interceptors),
        }
    }
}

#[derive(Clone)]
pub struct InterceptorMiddleware<S> {
    inner: S,
    interceptors: Arc<Vec<Arc<dyn Interceptor>>>,
}

impl<S> Service<Request<Body>> for InterceptorMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let interceptors = Arc::clone(&self.interceptors);
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut chain = Next::new(move |req| {
                Box::pin(async move {
                    let response = match inner.call(req).await {
                        Ok(response) => response,
                        Err(never) => match never {},
                    };
                    InterceptorResult::Ok(response)
                })
            });

            for interceptor in interceptors.iter().rev() {
                let interceptor = Arc::clone(interceptor);
                let next = chain;
                chain = Next::new(move |req| {
                    Box::pin(async move { interceptor.intercept(req, next).await })
                });
            }

            Ok(chain.run(request).await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "interceptor chain failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::InterceptorError;
    use async_trait::async_trait;
    use axum::{Router, routing::get};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Interceptor for Recorder {
        async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult {
            self.log.lock().unwrap().push(format!("{} before", self.name));
            let response = next.run(request).await;
            self.log.lock().unwrap().push(format!("{} after", self.name));
            response
        }
    }

    struct Refuse;

    #[async_trait]
    impl Interceptor for Refuse {
        async fn intercept(&self, _request: Request<Body>, _next: Next) -> InterceptorResult {
            Err(InterceptorError::from("refused"))
        }
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_first_interceptor_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let layer = InterceptorLayer::new(vec![
            Arc::new(Recorder { name: "outer", log: Arc::clone(&log) }),
            Arc::new(Recorder { name: "inner", log: Arc::clone(&log) }),
        ]);
        let app = Router::new().route("/", get(|| async { "ok" })).layer(layer);

        let response = app.oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            ["outer before", "inner before", "inner after", "outer after"]
        );
    }

    #[tokio::test]
    async fn test_interceptor_error_becomes_500() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(InterceptorLayer::new(vec![Arc::new(Refuse)]));

        let response = app.oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
