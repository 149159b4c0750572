//! Per-listener delivery pipeline
//!
//! hooks → transform → formatter → transport, strictly in that order.

use crate::error::{EventError, Result};
use crate::listener::Listener;
use crate::types::Event;

/// Deliver `event` through `listener`
///
/// The event must already be the listener's own copy. Returns `Ok(false)`
/// when a listener hook dropped it and `Ok(true)` once the transport
/// accepted the payload.
pub async fn deliver(listener: &Listener, event: Event) -> Result<bool> {
    let event = match listener.hooks().run(event).await? {
        Some(event) => event,
        None => {
            tracing::debug!(listener = %listener.name(), "Event dropped by listener hook");
            return Ok(false);
        }
    };

    let data = match listener.transform() {
        Some(transform) => transform
            .transform(&event)
            .await
            .map_err(EventError::transform)?,
        None => serde_json::to_value(&event)
            .map_err(|e| EventError::transform(EventError::Serialization(e)))?,
    };

    let formatted = listener
        .formatter()
        .format(&data)
        .await
        .map_err(EventError::format)?;

    listener.transport().send(&formatted, &event).await?;

    tracing::debug!(
        event = %event.name,
        uid = %event.uid,
        listener = %listener.name(),
        transport = listener.transport().name(),
        content_type = %formatted.content_type,
        "Event delivered"
    );

    Ok(true)
}
