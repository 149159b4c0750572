//! Hook pipeline
//!
//! Hooks inspect, replace, or drop an event before it moves on. The same
//! pipeline runs globally before listener selection and per listener
//! before delivery.
//!
//! Hooks run one at a time, in order. Each sees the event produced by the
//! hook before it:
//!
//! ```rust
//! use a3s_emitter::{hook_fn, Event, HookPipeline, HookResult};
//!
//! # async fn example() -> a3s_emitter::Result<()> {
//! let pipeline = HookPipeline::new()
//!     .with(hook_fn(|event: &Event| {
//!         let mut event = event.clone();
//!         event.payload["source"] = serde_json::json!("checkout");
//!         Ok(HookResult::replace(event))
//!     }))
//!     .with(hook_fn(|event: &Event| {
//!         if event.name.starts_with("internal.") {
//!             Ok(HookResult::dropped())
//!         } else {
//!             Ok(HookResult::continue_())
//!         }
//!     }));
//!
//! let event = Event::new("order.created", serde_json::json!({"id": 42}));
//! let event = pipeline.run(event).await?.expect("not dropped");
//! assert_eq!(event.payload["source"], "checkout");
//! # Ok(())
//! # }
//! ```

use crate::error::{EventError, Result};
use crate::types::Event;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a single hook
#[derive(Debug, Clone, PartialEq)]
pub enum HookResult {
    /// Continue with the current event, or with a replacement
    Continue(Option<Event>),
    /// Stop the pipeline; the event is not processed further
    Drop,
}

impl HookResult {
    /// Keep the event unchanged
    pub fn continue_() -> Self {
        Self::Continue(None)
    }

    /// Replace the event for the remaining hooks and the caller
    pub fn replace(event: Event) -> Self {
        Self::Continue(Some(event))
    }

    /// Drop the event
    pub fn dropped() -> Self {
        Self::Drop
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Check if this is a drop result
    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Drop)
    }
}

/// A mutation/short-circuit step applied to an event
#[async_trait]
pub trait EventHook: Send + Sync {
    /// Inspect the current event and decide how the pipeline continues
    async fn apply(&self, event: &Event) -> Result<HookResult>;
}

/// Hook backed by a synchronous closure
pub struct FnHook<F>(F);

/// Wrap a synchronous closure as a hook
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&Event) -> Result<HookResult> + Send + Sync,
{
    FnHook(f)
}

#[async_trait]
impl<F> EventHook for FnHook<F>
where
    F: Fn(&Event) -> Result<HookResult> + Send + Sync,
{
    async fn apply(&self, event: &Event) -> Result<HookResult> {
        (self.0)(event)
    }
}

/// Hook backed by an async closure
///
/// The closure receives its own copy of the event.
pub struct AsyncFnHook<F>(F);

/// Wrap an async closure as a hook
pub fn async_hook<F, Fut>(f: F) -> AsyncFnHook<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HookResult>> + Send + 'static,
{
    AsyncFnHook(f)
}

#[async_trait]
impl<F, Fut> EventHook for AsyncFnHook<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HookResult>> + Send + 'static,
{
    async fn apply(&self, event: &Event) -> Result<HookResult> {
        (self.0)(event.clone()).await
    }
}

/// Run `hooks` in order against `event`
///
/// Returns `Ok(None)` when a hook dropped the event. A failing hook stops
/// the pipeline and its error is returned as `EventError::Hook`.
pub async fn apply_hooks(hooks: &[Arc<dyn EventHook>], event: Event) -> Result<Option<Event>> {
    let mut current = event;

    for (index, hook) in hooks.iter().enumerate() {
        let result = hook
            .apply(&current)
            .await
            .map_err(|e| EventError::hook(index, e))?;

        match result {
            HookResult::Continue(None) => {}
            HookResult::Continue(Some(replacement)) => {
                current = replacement;
            }
            HookResult::Drop => {
                tracing::debug!(
                    event = %current.name,
                    uid = %current.uid,
                    hook = index,
                    "Event dropped by hook"
                );
                return Ok(None);
            }
        }
    }

    Ok(Some(current))
}

/// An ordered, immutable-after-build list of hooks
#[derive(Clone, Default)]
pub struct HookPipeline {
    hooks: Vec<Arc<dyn EventHook>>,
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookPipeline")
            .field("hooks_count", &self.hooks.len())
            .finish()
    }
}

impl HookPipeline {
    /// Create an empty pipeline (a no-op)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook
    pub fn with(mut self, hook: impl EventHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Append a shared hook
    pub fn with_shared(mut self, hook: Arc<dyn EventHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub(crate) fn push(&mut self, hook: Arc<dyn EventHook>) {
        self.hooks.push(hook);
    }

    pub(crate) fn extend(&mut self, other: HookPipeline) {
        self.hooks.extend(other.hooks);
    }

    /// Number of hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the pipeline has no hooks
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the pipeline; `Ok(None)` means the event was dropped
    pub async fn run(&self, event: Event) -> Result<Option<Event>> {
        apply_hooks(&self.hooks, event).await
    }
}

impl From<Vec<Arc<dyn EventHook>>> for HookPipeline {
    fn from(hooks: Vec<Arc<dyn EventHook>>) -> Self {
        Self { hooks }
    }
}

impl From<Arc<dyn EventHook>> for HookPipeline {
    fn from(hook: Arc<dyn EventHook>) -> Self {
        Self { hooks: vec![hook] }
    }
}
