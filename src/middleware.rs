//! HTTP request tracking for Axum
//!
//! Every request passing through [`stats_middleware`] is tracked with
//! [`StatsClient::track_http`]: one timer observation on the request bucket
//! and four counter increments. Responses with a status below 400 count as
//! successful.

use crate::client::StatsClient;
use axum::{extract::Request, middleware, middleware::Next, response::Response, Router};

/// Middleware that tracks each request through a [`StatsClient`].
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use stats_buckets::{StatsClient, stats_middleware};
///
/// let client = StatsClient::from_env()?;
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn(move |req, next| {
///         stats_middleware(client.clone(), req, next)
///     }));
/// ```
pub async fn stats_middleware(client: StatsClient, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let timer = client.build_timer();
    let response = next.run(request).await;

    let status = response.status();
    let success = !(status.is_client_error() || status.is_server_error());
    client.track_http(&method, &path, timer, success);

    response
}

/// Extension trait for tracking every request of an Axum Router.
///
/// ```ignore
/// use axum::{Router, routing::get};
/// use stats_buckets::{StatsClient, StatsRouter};
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .with_stats(StatsClient::from_env()?);
/// ```
pub trait StatsRouter {
    /// Layer [`stats_middleware`] over all routes.
    fn with_stats(self, client: StatsClient) -> Self;
}

impl<S> StatsRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_stats(self, client: StatsClient) -> Self {
        self.layer(middleware::from_fn(move |req, next| {
            stats_middleware(client.clone(), req, next)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(sink: Arc<MemorySink>) -> Router {
        let client = StatsClient::builder().sink(sink).build();

        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .with_stats(client)
    }

    async fn call(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_successful_request_tracked() {
        let sink = Arc::new(MemorySink::new());
        let status = call(app(sink.clone()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(sink.time_metrics().len(), 1);
        assert_eq!(sink.time_metrics()[0].bucket, "request.get.health");
        assert_eq!(sink.count("request-ok.get.health"), 1);
        assert_eq!(sink.count("total.request-ok"), 1);
    }

    #[tokio::test]
    async fn test_server_error_tracked_as_failure() {
        let sink = Arc::new(MemorySink::new());
        let status = call(app(sink.clone()), "/broken").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(sink.count("request-fail.get.broken"), 1);
        assert_eq!(sink.count("total.request-fail"), 1);
    }
}
