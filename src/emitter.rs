//! Dispatch engine
//!
//! `EventEmitter` creates events, runs the global hooks, selects listeners
//! and fans out to them concurrently. Everything is fixed at build time;
//! reconfiguring means building a new emitter.

use crate::boundary::{ErrorBoundary, OnError};
use crate::delivery::deliver;
use crate::error::{EmitError, EventError, Result};
use crate::hook::{EventHook, HookPipeline};
use crate::listener::Listener;
use crate::matcher::{GlobMatcher, Matcher};
use crate::selector::select;
use crate::types::{Base36UidGenerator, DispatchStrategy, Event, UidGenerator};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Routes named events to listeners
///
/// `EventEmitter` is `Send + Sync`; share it behind an `Arc` to emit from
/// several tasks. Concurrent `emit` calls share only the immutable
/// configuration.
pub struct EventEmitter {
    hooks: HookPipeline,
    strategy: DispatchStrategy,
    listeners: Vec<Listener>,
    uid_generator: Arc<dyn UidGenerator>,
    matcher: Arc<dyn Matcher>,
    boundary: ErrorBoundary,

    /// Number of `emit` calls currently running
    in_flight: watch::Sender<usize>,
}

impl EventEmitter {
    /// Start building an emitter
    pub fn builder() -> EventEmitterBuilder {
        EventEmitterBuilder::new()
    }

    /// Emit an event named `name` carrying `data`
    ///
    /// Returns `true` if at least one listener delivered the event. Every
    /// selected listener is attempted; one listener failing never stops
    /// the others. `Err` is returned only when the error boundary
    /// escalates: a call-scoped failure under `OnError::Raise`, or a
    /// failing error handler.
    pub async fn emit(&self, name: impl Into<String>, data: impl Serialize) -> Result<bool> {
        let _guard = InFlightGuard::new(&self.in_flight);

        let event = match serde_json::to_value(data)
            .map_err(|e| EventError::Creation(format!("payload is not serializable: {}", e)))
            .and_then(|payload| Event::create(name, payload, self.uid_generator.as_ref()))
        {
            Ok(event) => event,
            Err(cause) => {
                self.boundary.handle(EmitError::creation(cause)).await?;
                return Ok(false);
            }
        };

        tracing::debug!(event = %event.name, uid = %event.uid, "Event created");

        let event = match self.hooks.run(event.clone()).await {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(false),
            Err(cause) => {
                self.boundary
                    .handle(EmitError::dispatch(cause, event))
                    .await?;
                return Ok(false);
            }
        };

        let selected = select(&self.listeners, &event, self.strategy, self.matcher.as_ref());
        if selected.is_empty() {
            tracing::debug!(event = %event.name, uid = %event.uid, "No listener matched");
            return Ok(false);
        }

        tracing::debug!(
            event = %event.name,
            uid = %event.uid,
            listeners = selected.len(),
            "Dispatching event"
        );

        let results = join_all(
            selected
                .into_iter()
                .map(|listener| self.deliver_to(listener, &event)),
        )
        .await;

        let mut delivered = false;
        for result in results {
            delivered |= result?;
        }
        Ok(delivered)
    }

    /// Deliver a private copy of `event` to one listener, containing its failure
    async fn deliver_to(&self, listener: &Listener, event: &Event) -> Result<bool> {
        match deliver(listener, event.clone()).await {
            Ok(delivered) => Ok(delivered),
            Err(cause) => {
                self.boundary
                    .handle(EmitError::delivery(cause, event.clone(), listener.name()))
                    .await?;
                Ok(false)
            }
        }
    }

    /// Number of `emit` calls currently running
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Wait until no `emit` call is running
    ///
    /// Resolves immediately when the emitter is idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives as long as `self`, so this only returns once idle
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Configured listeners, in configuration order
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Configured dispatch strategy
    pub fn strategy(&self) -> DispatchStrategy {
        self.strategy
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("hooks", &self.hooks)
            .field("strategy", &self.strategy)
            .field("listeners", &self.listeners)
            .field("on_error", self.boundary.policy())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Decrements the in-flight count when an `emit` finishes or is dropped
struct InFlightGuard<'a> {
    counter: &'a watch::Sender<usize>,
}

impl<'a> InFlightGuard<'a> {
    fn new(counter: &'a watch::Sender<usize>) -> Self {
        counter.send_modify(|count| *count += 1);
        Self { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Builder for `EventEmitter`
pub struct EventEmitterBuilder {
    hooks: HookPipeline,
    strategy: DispatchStrategy,
    listeners: Vec<Listener>,
    uid_generator: Arc<dyn UidGenerator>,
    matcher: Arc<dyn Matcher>,
    on_error: OnError,
}

impl Default for EventEmitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitterBuilder {
    /// Create a builder with the defaults: no hooks, no listeners,
    /// `multi` strategy, base-36 uids, glob matching and `OnError::Raise`
    pub fn new() -> Self {
        Self {
            hooks: HookPipeline::new(),
            strategy: DispatchStrategy::default(),
            listeners: Vec::new(),
            uid_generator: Arc::new(Base36UidGenerator),
            matcher: Arc::new(GlobMatcher::new()),
            on_error: OnError::default(),
        }
    }

    /// Append a global hook
    pub fn hook(mut self, hook: impl EventHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Append global hooks (a single shared hook, a list, or a pipeline)
    pub fn hooks(mut self, hooks: impl Into<HookPipeline>) -> Self {
        self.hooks.extend(hooks.into());
        self
    }

    /// Set the dispatch strategy
    pub fn strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Append a listener
    pub fn listener(mut self, listener: Listener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Append several listeners
    pub fn listeners(mut self, listeners: impl IntoIterator<Item = Listener>) -> Self {
        self.listeners.extend(listeners);
        self
    }

    /// Set the uid generator
    pub fn uid_generator(mut self, generator: impl UidGenerator + 'static) -> Self {
        self.uid_generator = Arc::new(generator);
        self
    }

    /// Set the name matcher
    pub fn matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Set the error policy
    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// Build the emitter
    ///
    /// Fails if two listeners share a name.
    pub fn build(self) -> Result<EventEmitter> {
        let mut names = HashSet::new();
        for listener in &self.listeners {
            if !names.insert(listener.name()) {
                return Err(EventError::Config(format!(
                    "Duplicate listener name '{}'",
                    listener.name()
                )));
            }
        }

        tracing::info!(
            listeners = self.listeners.len(),
            hooks = self.hooks.len(),
            strategy = ?self.strategy,
            on_error = ?self.on_error,
            "Event emitter built"
        );

        let (in_flight, _) = watch::channel(0);

        Ok(EventEmitter {
            hooks: self.hooks,
            strategy: self.strategy,
            listeners: self.listeners,
            uid_generator: self.uid_generator,
            matcher: self.matcher,
            boundary: ErrorBoundary::new(self.on_error),
            in_flight,
        })
    }
}
