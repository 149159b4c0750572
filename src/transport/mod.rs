//! Transport trait, the delivery seam for listeners
//!
//! A transport receives the formatted payload together with the event it
//! was produced from, and performs the actual delivery (HTTP call, queue
//! write, in-memory record, ...). Each listener owns one transport.

use crate::error::Result;
use crate::types::{Event, FormattedEvent};
use async_trait::async_trait;

pub mod http;
pub mod memory;

/// Core trait for delivery backends
///
/// A failed send fails only the listener that owns the transport; sibling
/// listeners are unaffected. Implementations that need a deadline enforce
/// it themselves and report it as `EventError::Timeout`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `formatted`, produced from `event`
    async fn send(&self, formatted: &FormattedEvent, event: &Event) -> Result<()>;

    /// Transport name (e.g., "http", "memory"), used in logs
    fn name(&self) -> &str {
        "custom"
    }
}
