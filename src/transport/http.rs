//! HTTP webhook transport
//!
//! POSTs each formatted payload to a URL template. The template may use
//! `{eventName}` and `{uid}`, expanded with RFC 6570 simple-string
//! encoding:
//!
//! ```text
//! http://hooks.internal/event/{eventName}/notify
//!   + "order.created"  →  http://hooks.internal/event/order.created/notify
//! ```

use super::Transport;
use crate::error::{EventError, Result};
use crate::types::{Event, FormattedEvent};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTransportConfig {
    /// URL template (supports `{eventName}` and `{uid}`)
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra request headers; `content-type` always comes from the formatter
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl HttpTransportConfig {
    /// Create a config for `url` with default timeout and no extra headers
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            headers: HashMap::new(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Add a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Transport that POSTs payloads over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Build a transport, validating the URL template and headers
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(EventError::Config("HTTP transport URL is empty".to_string()));
        }
        if config.timeout_secs == 0 {
            return Err(EventError::Config(
                "HTTP transport timeout must be >= 1 second".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                EventError::Config(format!("Invalid header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                EventError::Config(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EventError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url,
            headers,
        })
    }

    /// The URL a given event is posted to
    pub fn url_for(&self, event: &Event) -> String {
        expand_url(&self.url, event)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("headers_count", &self.headers.len())
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, formatted: &FormattedEvent, event: &Event) -> Result<()> {
        let url = self.url_for(event);

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, formatted.content_type.as_str())
            .body(formatted.content.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EventError::Timeout(format!("POST {}: {}", url, e))
                } else {
                    EventError::Delivery {
                        target: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventError::Delivery {
                target: url,
                reason: format!("unexpected status {}", status),
            });
        }

        tracing::debug!(
            event = %event.name,
            uid = %event.uid,
            url = %url,
            status = status.as_u16(),
            "Event posted"
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Expand `{eventName}` and `{uid}`; unknown variables expand to nothing
fn expand_url(template: &str, event: &Event) -> String {
    let mut out = String::with_capacity(template.len() + event.name.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('}') {
            Some(end) => {
                match &after[..end] {
                    "eventName" => out.push_str(&urlencoding::encode(&event.name)),
                    "uid" => out.push_str(&urlencoding::encode(&event.uid)),
                    _ => {}
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
