//! Error boundary: where dispatch failures end up
//!
//! Every failure inside `emit` is wrapped in an `EmitError` and passed to
//! the boundary. With `OnError::Handler` the handler receives it; with
//! `OnError::Raise` call-scoped failures are escalated to the caller and
//! listener-scoped failures are logged.

use crate::error::{EmitError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Receives failures reported by the emitter
///
/// Returning `Err` is not contained: `emit` returns that error once every
/// sibling delivery has settled.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// Handle a dispatch failure
    async fn handle(&self, error: EmitError) -> Result<()>;
}

#[async_trait]
impl<F> ErrorHandler for F
where
    F: Fn(&EmitError) -> Result<()> + Send + Sync,
{
    async fn handle(&self, error: EmitError) -> Result<()> {
        self(&error)
    }
}

/// What the emitter does with a failure
#[derive(Clone, Default)]
pub enum OnError {
    /// Escalate call-scoped failures from `emit`; log listener-scoped ones
    #[default]
    Raise,
    /// Hand every failure to this handler
    Handler(Arc<dyn ErrorHandler>),
}

impl OnError {
    /// Route failures to `handler`
    pub fn handler(handler: impl ErrorHandler + 'static) -> Self {
        Self::Handler(Arc::new(handler))
    }
}

impl std::fmt::Debug for OnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raise => f.write_str("Raise"),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Applies the configured `OnError` policy
#[derive(Debug, Clone, Default)]
pub struct ErrorBoundary {
    policy: OnError,
}

impl ErrorBoundary {
    /// Create a boundary with the given policy
    pub fn new(policy: OnError) -> Self {
        Self { policy }
    }

    /// The configured policy
    pub fn policy(&self) -> &OnError {
        &self.policy
    }

    /// Report a failure
    ///
    /// Returns `Err` when the failure must leave `emit`: a call-scoped
    /// failure under `Raise`, or a failing handler.
    pub async fn handle(&self, error: EmitError) -> Result<()> {
        match &self.policy {
            OnError::Handler(handler) => {
                if error.is_listener_scoped() {
                    tracing::warn!(
                        listener = error.listener().unwrap_or_default(),
                        error = %error.error(),
                        "Listener delivery failed"
                    );
                }
                handler.handle(error).await
            }
            OnError::Raise if error.is_listener_scoped() => {
                tracing::error!(error = %error, "Listener delivery failed");
                Ok(())
            }
            OnError::Raise => Err(error.into()),
        }
    }
}

/// Handler that logs every failure through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorHandler;

#[async_trait]
impl ErrorHandler for LogErrorHandler {
    async fn handle(&self, error: EmitError) -> Result<()> {
        let event = error.event();
        tracing::error!(
            event = event.map(|e| e.name.as_str()).unwrap_or_default(),
            uid = event.map(|e| e.uid.as_str()).unwrap_or_default(),
            listener = error.listener().unwrap_or_default(),
            error = %error.error(),
            "Event dispatch failed"
        );
        Ok(())
    }
}

/// A failure as recorded by `MemoryErrorHandler`
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Full error message, including event and listener context
    pub message: String,

    /// Name of the event in scope, if one had been created
    pub event_name: Option<String>,

    /// Uid of the event in scope
    pub uid: Option<String>,

    /// Listener in scope, for listener-scoped failures
    pub listener: Option<String>,

    /// Unix timestamp in milliseconds when the failure was recorded
    pub recorded_at: u64,
}

impl ErrorRecord {
    /// Summarize an `EmitError`
    pub fn new(error: &EmitError) -> Self {
        Self {
            message: error.to_string(),
            event_name: error.event().map(|e| e.name.clone()),
            uid: error.event().map(|e| e.uid.clone()),
            listener: error.listener().map(str::to_string),
            recorded_at: now_millis(),
        }
    }
}

/// Handler that keeps failures in memory
///
/// Stores records in a `Vec` with configurable max capacity. Clones share
/// the same storage.
#[derive(Debug, Clone)]
pub struct MemoryErrorHandler {
    records: Arc<RwLock<Vec<ErrorRecord>>>,
    max_records: usize,
}

impl MemoryErrorHandler {
    /// Create a handler keeping at most `max_records` (0 = unbounded)
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            max_records,
        }
    }

    /// Number of recorded failures
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Recent failures, most recent first
    pub async fn list(&self, limit: usize) -> Vec<ErrorRecord> {
        let records = self.records.read().await;
        records.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for MemoryErrorHandler {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ErrorHandler for MemoryErrorHandler {
    async fn handle(&self, error: EmitError) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(ErrorRecord::new(&error));

        if self.max_records > 0 && records.len() > self.max_records {
            let drain_count = records.len() - self.max_records;
            records.drain(..drain_count);
        }

        Ok(())
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventError;
    use crate::types::Event;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_event() -> Event {
        Event::with_uid("order.created", "u1", serde_json::json!({}))
    }

    fn listener_error() -> EmitError {
        EmitError::delivery(
            EventError::Timeout("POST http://h".to_string()),
            sample_event(),
            "billing",
        )
    }

    fn call_error() -> EmitError {
        EmitError::dispatch(
            EventError::hook(0, EventError::Config("bad".to_string())),
            sample_event(),
        )
    }

    #[tokio::test]
    async fn test_raise_escalates_call_scoped() {
        let boundary = ErrorBoundary::default();
        let err = boundary.handle(call_error()).await.unwrap_err();
        match err {
            EventError::Unhandled(inner) => {
                assert_eq!(inner.event().unwrap().uid, "u1");
                assert!(inner.listener().is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_raise_contains_listener_scoped() {
        let boundary = ErrorBoundary::new(OnError::Raise);
        assert!(boundary.handle(listener_error()).await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_receives_both_scopes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let boundary = ErrorBoundary::new(OnError::handler(move |_: &EmitError| -> Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        boundary.handle(call_error()).await.unwrap();
        boundary.handle(listener_error()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_failure_propagates() {
        let boundary = ErrorBoundary::new(OnError::handler(|_: &EmitError| -> Result<()> {
            Err(EventError::Handler("pager offline".to_string()))
        }));

        let err = boundary.handle(listener_error()).await.unwrap_err();
        assert!(matches!(err, EventError::Handler(_)));
    }

    #[tokio::test]
    async fn test_log_handler_never_fails() {
        let boundary = ErrorBoundary::new(OnError::handler(LogErrorHandler));
        boundary.handle(call_error()).await.unwrap();
        boundary
            .handle(EmitError::creation(EventError::Creation("no uid".to_string())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_memory_handler_records_context() {
        let handler = MemoryErrorHandler::default();
        handler.handle(listener_error()).await.unwrap();

        assert_eq!(handler.count().await, 1);
        let record = &handler.list(10).await[0];
        assert_eq!(record.event_name.as_deref(), Some("order.created"));
        assert_eq!(record.uid.as_deref(), Some("u1"));
        assert_eq!(record.listener.as_deref(), Some("billing"));
        assert!(record.message.contains("timed out"));
        assert!(record.recorded_at > 0);
    }

    #[tokio::test]
    async fn test_memory_handler_list_and_capacity() {
        let handler = MemoryErrorHandler::new(3);
        for i in 0..5 {
            let err = EmitError::delivery(
                EventError::transform(EventError::Handler(format!("reason {}", i))),
                sample_event(),
                "l",
            );
            handler.handle(err).await.unwrap();
        }

        assert_eq!(handler.count().await, 3);
        let list = handler.list(2).await;
        assert_eq!(list.len(), 2);
        // Most recent first
        assert!(list[0].message.contains("reason 4"));
        assert!(list[1].message.contains("reason 3"));
    }

    #[test]
    fn test_on_error_debug() {
        assert_eq!(format!("{:?}", OnError::Raise), "Raise");
        assert_eq!(format!("{:?}", OnError::handler(LogErrorHandler)), "Handler(..)");
    }
}
