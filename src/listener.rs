//! Listeners: routing rules and their delivery stack
//!
//! A listener pairs match patterns with everything needed to deliver an
//! event: local hooks, an optional transform, a formatter, and a
//! transport. Listeners are immutable once built.

use crate::error::{EventError, Result};
use crate::format::{Formatter, JsonFormatter, Transform};
use crate::hook::{EventHook, HookPipeline};
use crate::transport::Transport;
use crate::types::MultiStrategy;
use std::sync::Arc;

/// A routing rule: which events it takes and how it delivers them
#[derive(Clone)]
pub struct Listener {
    name: String,
    patterns: Vec<String>,
    multi_strategy: MultiStrategy,
    hooks: HookPipeline,
    transform: Option<Arc<dyn Transform>>,
    formatter: Arc<dyn Formatter>,
    transport: Arc<dyn Transport>,
}

impl Listener {
    /// Start building a listener identified by `name`
    pub fn builder(name: impl Into<String>) -> ListenerBuilder {
        ListenerBuilder::new(name)
    }

    /// Listener identity, used in logs and error reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Glob patterns tested against event names
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// How this listener combines with others under `DispatchStrategy::Multi`
    pub fn multi_strategy(&self) -> MultiStrategy {
        self.multi_strategy
    }

    /// Listener-local hooks
    pub fn hooks(&self) -> &HookPipeline {
        &self.hooks
    }

    /// Transform, if any (absent means the event itself is formatted)
    pub fn transform(&self) -> Option<&dyn Transform> {
        self.transform.as_deref()
    }

    /// Formatter
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    /// Transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("multi_strategy", &self.multi_strategy)
            .field("hooks", &self.hooks)
            .field("has_transform", &self.transform.is_some())
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// Builder for `Listener`
///
/// The formatter defaults to `JsonFormatter`. A name, at least one
/// pattern, and a transport are required.
pub struct ListenerBuilder {
    name: String,
    patterns: Vec<String>,
    multi_strategy: MultiStrategy,
    hooks: HookPipeline,
    transform: Option<Arc<dyn Transform>>,
    formatter: Option<Arc<dyn Formatter>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ListenerBuilder {
    /// Create a builder for a listener named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
            multi_strategy: MultiStrategy::default(),
            hooks: HookPipeline::new(),
            transform: None,
            formatter: None,
            transport: None,
        }
    }

    /// Add a match pattern
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Add several match patterns
    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Set the multi strategy
    pub fn multi_strategy(mut self, strategy: MultiStrategy) -> Self {
        self.multi_strategy = strategy;
        self
    }

    /// Append a listener-local hook
    pub fn hook(mut self, hook: impl EventHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Append a shared listener-local hook
    pub fn shared_hook(mut self, hook: Arc<dyn EventHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Set the transform
    pub fn transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Set the formatter
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Set the transport
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set a transport shared with other owners
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate and build the listener
    pub fn build(self) -> Result<Listener> {
        if self.name.trim().is_empty() {
            return Err(EventError::Config("Listener name cannot be empty".to_string()));
        }
        if self.patterns.is_empty() {
            return Err(EventError::Config(format!(
                "Listener '{}' needs at least one match pattern",
                self.name
            )));
        }
        if let Some(blank) = self.patterns.iter().find(|p| p.trim().is_empty()) {
            return Err(EventError::Config(format!(
                "Listener '{}' has a blank match pattern '{}'",
                self.name, blank
            )));
        }
        let transport = self.transport.ok_or_else(|| {
            EventError::Config(format!("Listener '{}' has no transport", self.name))
        })?;

        Ok(Listener {
            name: self.name,
            patterns: self.patterns,
            multi_strategy: self.multi_strategy,
            hooks: self.hooks,
            transform: self.transform,
            formatter: self.formatter.unwrap_or_else(|| Arc::new(JsonFormatter)),
            transport,
        })
    }
}
