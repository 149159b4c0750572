//! Declarative routing configuration
//!
//! Describes an emitter whose listeners POST to HTTP endpoints, loaded
//! from TOML or JSON:
//!
//! ```toml
//! strategy = "multi"
//!
//! [[routes]]
//! name = "orders"
//! patterns = "order.*"
//! url = "https://hooks.internal/event/{eventName}"
//!
//! [[routes]]
//! patterns = ["user.*", "!user.internal.*"]
//! multiStrategy = "replace"
//! url = "https://audit.internal/ingest"
//! timeoutSecs = 5
//! headers = { "x-api-key" = "secret" }
//! ```
//!
//! Hooks, transforms, and error handlers are code, not configuration: add
//! them to the builder returned by `EmitterConfig::into_builder`.

use crate::emitter::EventEmitterBuilder;
use crate::error::{EventError, Result};
use crate::listener::Listener;
use crate::transport::http::{HttpTransport, HttpTransportConfig};
use crate::types::{DispatchStrategy, MultiStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Emitter configuration: a strategy and an ordered list of routes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterConfig {
    /// Fan-out strategy (default: `multi`)
    #[serde(default)]
    pub strategy: DispatchStrategy,

    /// Routes in priority order
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// One HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// Listener name (default: `listener-<index>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Match patterns; a single string is accepted
    #[serde(alias = "pattern", deserialize_with = "one_or_many")]
    pub patterns: Vec<String>,

    /// Combination rule under the `multi` strategy
    #[serde(default)]
    pub multi_strategy: MultiStrategy,

    /// URL template (supports `{eventName}` and `{uid}`)
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra request headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}

impl RouteConfig {
    /// Create a route for `patterns` posting to `url`
    pub fn new<I, S>(patterns: I, url: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            patterns: patterns.into_iter().map(Into::into).collect(),
            multi_strategy: MultiStrategy::default(),
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            headers: HashMap::new(),
        }
    }

    fn listener_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("listener-{}", index))
    }

    /// Build the HTTP listener for this route
    pub fn to_listener(&self, index: usize) -> Result<Listener> {
        let transport = HttpTransport::new(HttpTransportConfig {
            url: self.url.clone(),
            timeout_secs: self.timeout_secs,
            headers: self.headers.clone(),
        })?;

        Listener::builder(self.listener_name(index))
            .patterns(self.patterns.iter().cloned())
            .multi_strategy(self.multi_strategy)
            .transport(transport)
            .build()
    }
}

impl EmitterConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EventError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Parse a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| EventError::Config(format!("Failed to parse JSON config: {}", e)))
    }

    /// Load a `.toml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EventError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                EventError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                EventError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            _ => {
                return Err(EventError::Config(format!(
                    "Unsupported config file {} (expected .toml or .json)",
                    path.display()
                )))
            }
        };

        tracing::debug!(path = %path.display(), routes = config.routes.len(), "Config loaded");
        Ok(config)
    }

    /// Check every route for patterns and a URL
    pub fn validate(&self) -> Result<()> {
        for (index, route) in self.routes.iter().enumerate() {
            let name = route.listener_name(index);
            if route.patterns.is_empty() || route.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(EventError::Config(format!(
                    "Route '{}' needs at least one non-blank pattern",
                    name
                )));
            }
            if route.url.trim().is_empty() {
                return Err(EventError::Config(format!("Route '{}' has no url", name)));
            }
        }
        Ok(())
    }

    /// Build HTTP listeners and return a builder carrying them
    ///
    /// Further hooks, listeners, and an error policy can be added before
    /// `build`.
    pub fn into_builder(self) -> Result<EventEmitterBuilder> {
        self.validate()?;

        let listeners = self
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| route.to_listener(index))
            .collect::<Result<Vec<_>>>()?;

        Ok(EventEmitterBuilder::new()
            .strategy(self.strategy)
            .listeners(listeners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
        strategy = "firstMatch"

        [[routes]]
        name = "orders"
        patterns = "order.*"
        url = "http://localhost:9000/event/{eventName}"

        [[routes]]
        patterns = ["user.*", "!user.internal.*"]
        multiStrategy = "skip"
        url = "http://localhost:9000/users"
        timeoutSecs = 5
        headers = { "x-api-key" = "secret" }
    "#;

    #[test]
    fn test_parse_toml() {
        let config = EmitterConfig::from_toml_str(TOML).unwrap();

        assert_eq!(config.strategy, DispatchStrategy::FirstMatch);
        assert_eq!(config.routes.len(), 2);

        let orders = &config.routes[0];
        assert_eq!(orders.name.as_deref(), Some("orders"));
        assert_eq!(orders.patterns, vec!["order.*"]);
        assert_eq!(orders.multi_strategy, MultiStrategy::None);
        assert_eq!(orders.timeout_secs, 30);

        let users = &config.routes[1];
        assert!(users.name.is_none());
        assert_eq!(users.patterns.len(), 2);
        assert_eq!(users.multi_strategy, MultiStrategy::Skip);
        assert_eq!(users.timeout_secs, 5);
        assert_eq!(users.headers.get("x-api-key").map(String::as_str), Some("secret"));
    }

    #[test]
    fn test_parse_json() {
        let config = EmitterConfig::from_json_str(
            r#"{
                "routes": [
                    {"pattern": "billing/**", "url": "http://h/{eventName}"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.strategy, DispatchStrategy::Multi);
        assert_eq!(config.routes[0].patterns, vec!["billing/**"]);
    }

    #[test]
    fn test_parse_error_is_config() {
        let err = EmitterConfig::from_toml_str("routes = 3").unwrap_err();
        assert!(matches!(err, EventError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_patterns() {
        let config = EmitterConfig {
            strategy: DispatchStrategy::Multi,
            routes: vec![RouteConfig::new(Vec::<String>::new(), "http://h")],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listener-0"));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = EmitterConfig {
            strategy: DispatchStrategy::Multi,
            routes: vec![RouteConfig::new(["a.*"], " ")],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_into_builder_names_listeners() {
        let emitter = EmitterConfig::from_toml_str(TOML)
            .unwrap()
            .into_builder()
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(emitter.strategy(), DispatchStrategy::FirstMatch);
        let names: Vec<&str> = emitter.listeners().iter().map(|l| l.name()).collect();
        assert_eq!(names, ["orders", "listener-1"]);
        assert_eq!(emitter.listeners()[0].transport().name(), "http");
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("a3s-emitter-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let toml_path = dir.join("emitter.toml");
        std::fs::write(&toml_path, TOML).unwrap();
        assert_eq!(EmitterConfig::from_file(&toml_path).unwrap().routes.len(), 2);

        let json_path = dir.join("emitter.json");
        std::fs::write(&json_path, r#"{"routes": []}"#).unwrap();
        assert!(EmitterConfig::from_file(&json_path).unwrap().routes.is_empty());

        let yaml_path = dir.join("emitter.yaml");
        std::fs::write(&yaml_path, "routes: []").unwrap();
        let err = EmitterConfig::from_file(&yaml_path).unwrap_err();
        assert!(err.to_string().contains("expected .toml or .json"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_from_file_missing() {
        let err = EmitterConfig::from_file("/nonexistent/a3s/emitter.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = EmitterConfig::from_toml_str(TOML).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"multiStrategy\":\"skip\""));
        assert!(json.contains("\"timeoutSecs\":5"));

        let parsed = EmitterConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.routes.len(), 2);
        assert_eq!(parsed.routes[1].patterns, config.routes[1].patterns);
    }
}
