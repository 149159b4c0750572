//! Core event types for the a3s-emitter system
//!
//! All types use camelCase JSON serialization for wire compatibility.

use crate::error::{EventError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single named occurrence routed by the emitter
///
/// Names are dot- or slash-segmented (e.g., `order.created`,
/// `billing/invoice/paid`) and are what listener patterns match against.
/// Cloning an event is a full structural copy: the payload shares nothing
/// with the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event name used for routing
    pub name: String,

    /// Creation time, assigned once by the emitter
    pub timestamp: DateTime<Utc>,

    /// Unique identifier for correlation and tracing
    pub uid: String,

    /// Event payload (arbitrary JSON data)
    pub payload: serde_json::Value,
}

impl Event {
    /// Create a new event with a random base-36 uid and the current time
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::with_uid(name, base36_uid(), payload)
    }

    /// Create an event with an explicit uid
    pub fn with_uid(
        name: impl Into<String>,
        uid: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            uid: uid.into(),
            payload,
        }
    }

    /// Create an event using a pluggable uid generator
    ///
    /// Fails if the generator fails or returns an empty uid.
    pub fn create(
        name: impl Into<String>,
        payload: serde_json::Value,
        uid_generator: &dyn UidGenerator,
    ) -> Result<Self> {
        let uid = uid_generator.generate()?;
        if uid.is_empty() {
            return Err(EventError::Creation(
                "uid generator returned an empty uid".to_string(),
            ));
        }
        Ok(Self::with_uid(name, uid, payload))
    }
}

/// A serialized payload ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEvent {
    /// MIME type of `content` (e.g., `application/json`)
    pub content_type: String,

    /// Serialized bytes
    pub content: Bytes,
}

impl FormattedEvent {
    /// Create a formatted event
    pub fn new(content_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// Fan-out strategy applied to the listeners that match an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchStrategy {
    /// Only the first matching listener (in configuration order)
    FirstMatch,
    /// Only the last matching listener
    LastMatch,
    /// Every matching listener, subject to each listener's `MultiStrategy`
    #[default]
    Multi,
}

/// How a listener combines with listeners selected before it under `Multi`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiStrategy {
    /// Append to the selection
    #[default]
    None,
    /// Discard everything selected so far and start over with this listener
    Replace,
    /// Ignore this listener if something is already selected
    Skip,
}

/// Source of event uids
pub trait UidGenerator: Send + Sync {
    /// Produce a new, never reused identifier
    fn generate(&self) -> Result<String>;
}

impl<F> UidGenerator for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn generate(&self) -> Result<String> {
        self()
    }
}

/// Default generator: a random v4 uuid rendered in base 36
#[derive(Debug, Clone, Copy, Default)]
pub struct Base36UidGenerator;

impl UidGenerator for Base36UidGenerator {
    fn generate(&self) -> Result<String> {
        Ok(base36_uid())
    }
}

fn base36_uid() -> String {
    to_base36(uuid::Uuid::new_v4().as_u128())
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(25);
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.iter().rev().collect()
}
