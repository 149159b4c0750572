//! Payload shaping: transforms and formatters
//!
//! A listener turns an event into bytes in two steps. The transform maps
//! the event to an arbitrary JSON shape; the formatter serializes that
//! shape and names its content type.

use crate::error::{EventError, Result};
use crate::types::{Event, FormattedEvent};
use async_trait::async_trait;

/// Content type produced by `JsonFormatter`
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Maps an event to the data a listener sends
#[async_trait]
pub trait Transform: Send + Sync {
    /// Produce the data to format for `event`
    async fn transform(&self, event: &Event) -> Result<serde_json::Value>;
}

/// Transform backed by a synchronous closure
pub struct FnTransform<F>(F);

/// Wrap a closure as a transform
pub fn transform_fn<F>(f: F) -> FnTransform<F>
where
    F: Fn(&Event) -> Result<serde_json::Value> + Send + Sync,
{
    FnTransform(f)
}

#[async_trait]
impl<F> Transform for FnTransform<F>
where
    F: Fn(&Event) -> Result<serde_json::Value> + Send + Sync,
{
    async fn transform(&self, event: &Event) -> Result<serde_json::Value> {
        (self.0)(event)
    }
}

/// Serializes transformed data for a transport
///
/// Implementations must be deterministic: identical input yields
/// byte-identical output.
#[async_trait]
pub trait Formatter: Send + Sync {
    /// Serialize `data`
    async fn format(&self, data: &serde_json::Value) -> Result<FormattedEvent>;
}

/// Compact JSON formatter (`application/json`)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[async_trait]
impl Formatter for JsonFormatter {
    async fn format(&self, data: &serde_json::Value) -> Result<FormattedEvent> {
        let content = serde_json::to_vec(data).map_err(|e| EventError::format(e.into()))?;
        Ok(FormattedEvent::new(JSON_CONTENT_TYPE, content))
    }
}

/// Formatter backed by a synchronous closure
pub struct FnFormatter<F>(F);

/// Wrap a closure as a formatter
pub fn formatter_fn<F>(f: F) -> FnFormatter<F>
where
    F: Fn(&serde_json::Value) -> Result<FormattedEvent> + Send + Sync,
{
    FnFormatter(f)
}

#[async_trait]
impl<F> Formatter for FnFormatter<F>
where
    F: Fn(&serde_json::Value) -> Result<FormattedEvent> + Send + Sync,
{
    async fn format(&self, data: &serde_json::Value) -> Result<FormattedEvent> {
        (self.0)(data)
    }
}
