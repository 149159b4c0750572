//! In-memory transport for development and testing
//!
//! Records every delivery instead of sending it anywhere.

use super::Transport;
use crate::error::Result;
use crate::types::{Event, FormattedEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A payload captured by `MemoryTransport`
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The formatted payload as the transport received it
    pub formatted: FormattedEvent,

    /// The listener's event after its hooks ran
    pub event: Event,
}

impl Delivery {
    /// Parse the delivered content as JSON
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.formatted.content)?)
    }
}

/// Transport that keeps deliveries in a bounded `Vec`
///
/// Oldest deliveries are discarded once `max_deliveries` is exceeded.
#[derive(Clone)]
pub struct MemoryTransport {
    deliveries: Arc<RwLock<Vec<Delivery>>>,
    max_deliveries: usize,
}

impl MemoryTransport {
    /// Create a transport keeping at most `max_deliveries` (0 = unbounded)
    pub fn new(max_deliveries: usize) -> Self {
        Self {
            deliveries: Arc::new(RwLock::new(Vec::new())),
            max_deliveries,
        }
    }

    /// Number of recorded deliveries
    pub async fn count(&self) -> usize {
        self.deliveries.read().await.len()
    }

    /// All recorded deliveries, oldest first
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.read().await.clone()
    }

    /// Most recent delivery, if any
    pub async fn last(&self) -> Option<Delivery> {
        self.deliveries.read().await.last().cloned()
    }

    /// Forget all recorded deliveries
    pub async fn clear(&self) {
        self.deliveries.write().await.clear();
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("max_deliveries", &self.max_deliveries)
            .finish()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, formatted: &FormattedEvent, event: &Event) -> Result<()> {
        let mut deliveries = self.deliveries.write().await;
        deliveries.push(Delivery {
            formatted: formatted.clone(),
            event: event.clone(),
        });

        // Enforce max capacity
        if self.max_deliveries > 0 && deliveries.len() > self.max_deliveries {
            let drain_count = deliveries.len() - self.max_deliveries;
            deliveries.drain(..drain_count);
        }

        tracing::debug!(
            event = %event.name,
            uid = %event.uid,
            bytes = formatted.content.len(),
            "Event recorded in memory"
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(i: usize) -> FormattedEvent {
        FormattedEvent::new("application/json", format!("{{\"i\":{}}}", i))
    }

    #[tokio::test]
    async fn test_records_delivery() {
        let transport = MemoryTransport::default();
        let event = Event::new("order.created", serde_json::json!({"id": 1}));

        transport.send(&formatted(1), &event).await.unwrap();

        assert_eq!(transport.count().await, 1);
        let delivery = transport.last().await.unwrap();
        assert_eq!(delivery.event.uid, event.uid);
        assert_eq!(delivery.json().unwrap()["i"], 1);
    }

    #[tokio::test]
    async fn test_max_capacity() {
        let transport = MemoryTransport::new(3);
        let event = Event::new("tick", serde_json::json!(null));

        for i in 0..5 {
            transport.send(&formatted(i), &event).await.unwrap();
        }

        let deliveries = transport.deliveries().await;
        assert_eq!(deliveries.len(), 3);
        // Oldest deliveries drained
        assert_eq!(deliveries[0].json().unwrap()["i"], 2);
        assert_eq!(deliveries[2].json().unwrap()["i"], 4);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let transport = MemoryTransport::default();
        let handle = transport.clone();
        let event = Event::new("tick", serde_json::json!(null));

        transport.send(&formatted(0), &event).await.unwrap();
        assert_eq!(handle.count().await, 1);

        handle.clear().await;
        assert_eq!(transport.count().await, 0);
    }

    #[test]
    fn test_name() {
        assert_eq!(MemoryTransport::default().name(), "memory");
    }
}
