//! # a3s-emitter
//!
//! In-process event dispatch for the A3S ecosystem.
//!
//! ## Overview
//!
//! `a3s-emitter` accepts named application events and routes each one to
//! zero or more listeners chosen by glob matching on the event name. Every
//! listener runs its own hooks, shapes the event with a transform and a
//! formatter, and hands the bytes to a pluggable transport (HTTP, memory,
//! or your own).
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_emitter::{EventEmitter, Listener, MemoryTransport};
//!
//! # async fn example() -> a3s_emitter::Result<()> {
//! let transport = MemoryTransport::default();
//!
//! let emitter = EventEmitter::builder()
//!     .listener(
//!         Listener::builder("orders")
//!             .pattern("order.*")
//!             .transport(transport.clone())
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let delivered = emitter
//!     .emit("order.created", serde_json::json!({"id": 42}))
//!     .await?;
//!
//! assert!(delivered);
//! assert_eq!(transport.count().await, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Dispatch
//!
//! 1. The event is created with a fresh uid and timestamp
//! 2. Global hooks may replace or drop it
//! 3. Matching listeners are selected by the `DispatchStrategy`
//! 4. Each selected listener receives its own copy, concurrently:
//!    hooks → transform → formatter → transport
//!
//! A failing listener never affects its siblings. Failures go to the
//! error boundary configured with `OnError`.
//!
//! ## Transports
//!
//! - **http**: POST to a URL template (`{eventName}`, `{uid}`)
//! - **memory**: record deliveries for tests and in-process consumers

pub mod boundary;
pub mod config;
pub mod delivery;
pub mod emitter;
pub mod error;
pub mod format;
pub mod hook;
pub mod listener;
pub mod matcher;
pub mod selector;
pub mod transport;
pub mod types;

// Re-export core types
pub use boundary::{
    ErrorBoundary, ErrorHandler, ErrorRecord, LogErrorHandler, MemoryErrorHandler, OnError,
};
pub use config::{EmitterConfig, RouteConfig};
pub use emitter::{EventEmitter, EventEmitterBuilder};
pub use error::{EmitError, EventError, Result};
pub use format::{
    formatter_fn, transform_fn, Formatter, JsonFormatter, Transform, JSON_CONTENT_TYPE,
};
pub use hook::{async_hook, hook_fn, EventHook, HookPipeline, HookResult};
pub use listener::{Listener, ListenerBuilder};
pub use matcher::{GlobMatcher, Matcher};
pub use selector::select;
pub use transport::http::{HttpTransport, HttpTransportConfig};
pub use transport::memory::{Delivery, MemoryTransport};
pub use transport::Transport;
pub use types::{
    Base36UidGenerator, DispatchStrategy, Event, FormattedEvent, MultiStrategy, UidGenerator,
};
