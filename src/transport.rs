//! Transport to the platform API
//!
//! Issues one HTTP call per [`RequestContext`] and always answers with either
//! a [`ResponseBody`] or a [`NormalizedError`].

mod error;
mod http;
mod normalize;
mod types;

pub use error::{ErrorKind, NormalizedError};
pub use http::HttpTransport;
pub use normalize::{normalize, RawFailure, CONNECTION_FAILED};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for issuing API calls
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, ctx: RequestContext) -> Result<ResponseBody, NormalizedError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, ctx: RequestContext) -> Result<ResponseBody, NormalizedError> {
        (**self).execute(ctx).await
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn execute(&self, ctx: RequestContext) -> Result<ResponseBody, NormalizedError> {
        let method = ctx.method.as_str();
        let path = ctx.path.clone();
        let start = std::time::Instant::now();
        let result = self.inner.execute(ctx).await;
        let duration = start.elapsed();

        match &result {
            Ok(body) => {
                let bytes = match body {
                    ResponseBody::Binary(bytes) => bytes.len(),
                    ResponseBody::Json(_) => 0,
                };
                tracing::info!(
                    method,
                    path = %path,
                    duration_ms = %duration.as_millis(),
                    binary_bytes = bytes,
                    "API request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    method,
                    path = %path,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    status = ?e.http_status,
                    error = %e.message,
                    retryable = e.is_retryable(),
                    "API request failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_logging_transport_passes_results_through() {
        let mock = MockTransport::new();
        mock.queue_json(json!({ "answer": "ok" }));
        mock.queue_bytes(b"doc".to_vec());
        mock.queue_error(NormalizedError::http_status(503, "Service Unavailable"));
        let transport = LoggingTransport::new(Arc::new(mock));

        let json = transport.execute(RequestContext::get("/a")).await.unwrap();
        assert_eq!(json, ResponseBody::Json(json!({ "answer": "ok" })));

        let bytes = transport
            .execute(RequestContext::get("/b").binary())
            .await
            .unwrap();
        assert_eq!(bytes, ResponseBody::Binary(b"doc".to_vec()));

        let err = transport
            .execute(RequestContext::post("/c").authenticated())
            .await
            .unwrap_err();
        assert_eq!(err, NormalizedError::http_status(503, "Service Unavailable"));
    }

    #[tokio::test]
    async fn test_logging_transport_forwards_request_unchanged() {
        let mock = Arc::new(MockTransport::new());
        mock.queue_json(json!(null));
        let transport = LoggingTransport::new(mock.clone());

        let request = RequestContext::post("/api/v1/assessments/")
            .with_json(json!({ "question": "q" }))
            .with_query("u", "amal")
            .authenticated();
        transport.execute(request.clone()).await.unwrap();

        assert_eq!(mock.recorded_requests(), vec![request]);
    }
}
