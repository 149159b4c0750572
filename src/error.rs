//! Error types for a3s-emitter

use crate::types::Event;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while building or running an emitter
#[derive(Debug, Error)]
pub enum EventError {
    /// Event construction failed (uid generation, payload conversion)
    #[error("Event creation failed: {0}")]
    Creation(String),

    /// A global or listener-local hook failed
    #[error("Hook #{index} failed: {source}")]
    Hook {
        index: usize,
        #[source]
        source: Box<EventError>,
    },

    /// A listener transform failed
    #[error("Transform failed: {source}")]
    Transform {
        #[source]
        source: Box<EventError>,
    },

    /// A listener formatter failed
    #[error("Format failed: {source}")]
    Format {
        #[source]
        source: Box<EventError>,
    },

    /// Transport delivery failure
    #[error("Failed to deliver event to '{target}': {reason}")]
    Delivery { target: String, reason: String },

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure raised by a user-supplied error handler
    #[error("Error handler failed: {0}")]
    Handler(String),

    /// A call-scoped failure escalated because no handler is configured
    #[error(transparent)]
    Unhandled(Box<EmitError>),
}

/// Result type alias for emitter operations
pub type Result<T> = std::result::Result<T, EventError>;

impl EventError {
    /// Wrap a failure of the hook at `index`
    pub fn hook(index: usize, source: EventError) -> Self {
        Self::Hook {
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a transform failure; transform failures pass through unchanged
    pub fn transform(source: EventError) -> Self {
        match source {
            Self::Transform { .. } => source,
            other => Self::Transform {
                source: Box::new(other),
            },
        }
    }

    /// Wrap a formatter failure; format failures pass through unchanged
    pub fn format(source: EventError) -> Self {
        match source {
            Self::Format { .. } => source,
            other => Self::Format {
                source: Box::new(other),
            },
        }
    }

    /// The innermost error of a hook/transform/format/unhandled chain
    pub fn root(&self) -> &EventError {
        match self {
            Self::Hook { source, .. } | Self::Transform { source } | Self::Format { source } => {
                source.root()
            }
            Self::Unhandled(inner) => inner.error().root(),
            other => other,
        }
    }
}

/// A dispatch-time failure with the event and listener it happened under
///
/// Built by the emitter and handed to the error boundary. The event is
/// absent when creation itself failed; the listener is absent for
/// call-scoped failures (creation, global hooks).
#[derive(Debug)]
pub struct EmitError {
    cause: EventError,
    event: Option<Event>,
    listener: Option<String>,
}

impl EmitError {
    /// Wrap a failure that happened before an event existed
    pub fn creation(cause: EventError) -> Self {
        Self {
            cause,
            event: None,
            listener: None,
        }
    }

    /// Wrap a call-scoped failure for an existing event
    pub fn dispatch(cause: EventError, event: Event) -> Self {
        Self {
            cause,
            event: Some(event),
            listener: None,
        }
    }

    /// Wrap a failure inside one listener's delivery pipeline
    pub fn delivery(cause: EventError, event: Event, listener: impl Into<String>) -> Self {
        Self {
            cause,
            event: Some(event),
            listener: Some(listener.into()),
        }
    }

    /// The underlying failure
    pub fn error(&self) -> &EventError {
        &self.cause
    }

    /// The event in scope, if one had been created
    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    /// Name of the listener in scope, if the failure was listener-scoped
    pub fn listener(&self) -> Option<&str> {
        self.listener.as_deref()
    }

    /// Whether the failure only affected a single listener
    pub fn is_listener_scoped(&self) -> bool {
        self.listener.is_some()
    }

    /// Consume the record, returning the underlying failure
    pub fn into_error(self) -> EventError {
        self.cause
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.event, &self.listener) {
            (Some(event), Some(listener)) => write!(
                f,
                "Failed to deliver event '{}' ({}) to listener '{}': {}",
                event.name, event.uid, listener, self.cause
            ),
            (Some(event), None) => write!(
                f,
                "Failed to dispatch event '{}' ({}): {}",
                event.name, event.uid, self.cause
            ),
            (None, _) => write!(f, "Failed to create event: {}", self.cause),
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<EmitError> for EventError {
    fn from(err: EmitError) -> Self {
        EventError::Unhandled(Box::new(err))
    }
}
