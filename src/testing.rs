//! Mock implementations for testing
//!
//! These mocks let the session manager, assessment form and downloader run
//! without a server.

use crate::download::DocumentSink;
use crate::transport::{NormalizedError, RequestContext, ResponseBody, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Transport
// ============================================================================

/// Transport that answers with queued responses and records every call
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ResponseBody, NormalizedError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<RequestContext>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON response
    pub fn queue_json(&self, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ResponseBody::Json(value)));
    }

    /// Queue a successful binary response
    pub fn queue_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ResponseBody::Binary(bytes.into())));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: NormalizedError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RequestContext> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_response(&self) -> Result<ResponseBody, NormalizedError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NormalizedError::network("No mock response queued")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, ctx: RequestContext) -> Result<ResponseBody, NormalizedError> {
        self.requests.lock().unwrap().push(ctx);
        self.next_response()
    }
}

// ============================================================================
// Gated Mock Transport (for in-flight testing)
// ============================================================================

/// Transport that parks every call until the test releases it
pub struct GatedMockTransport {
    inner: MockTransport,
    /// Signalled when a request reaches the transport
    pub request_started: Arc<Notify>,
    /// Signal to let one parked request finish
    pub release: Arc<Notify>,
}

impl GatedMockTransport {
    pub fn new() -> Self {
        Self {
            inner: MockTransport::new(),
            request_started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_json(&self, value: Value) {
        self.inner.queue_json(value);
    }

    pub fn queue_error(&self, error: NormalizedError) {
        self.inner.queue_error(error);
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

#[async_trait]
impl Transport for GatedMockTransport {
    async fn execute(&self, ctx: RequestContext) -> Result<ResponseBody, NormalizedError> {
        self.inner.requests.lock().unwrap().push(ctx);
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.next_response()
    }
}

// ============================================================================
// Recording Document Sink
// ============================================================================

/// Sink that keeps saved documents in memory
#[derive(Default)]
pub struct RecordingSink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_with: Option<String>,
}

impl RecordingSink {
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl DocumentSink for RecordingSink {
    fn save(&self, bytes: &[u8], filename: &str) -> std::io::Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(std::io::Error::other(message.clone()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}
