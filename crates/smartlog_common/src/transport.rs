//! Dataset transport
//!
//! The only code in the crate that touches the network. A real blocking HTTP
//! client for the endpoints and a scripted fake for tests.

use crate::error::TransportError;
use anyhow::Result;
use std::sync::Mutex;
use std::time::Duration;

/// Fetches a JSON document from a dataset endpoint
pub trait DatasetTransport: Send + Sync {
    fn fetch_json(&self, url: &str, timeout: Duration) -> Result<serde_json::Value, TransportError>;
}

/// Real transport using `reqwest::blocking`
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("smartlog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl DatasetTransport for HttpTransport {
    fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError> {
        if url.trim().is_empty() {
            return Err(TransportError::NotConfigured);
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(timeout.as_secs())
                } else {
                    TransportError::Http(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        response
            .json()
            .map_err(|e| TransportError::InvalidJson(format!("Failed to parse response: {}", e)))
    }
}

/// Scripted transport for tests
pub struct FakeTransport {
    responses: Mutex<Vec<Result<serde_json::Value, TransportError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    /// Responses are handed out in order; the last one repeats forever
    pub fn new(responses: Vec<Result<serde_json::Value, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(json: serde_json::Value) -> Self {
        Self::new(vec![Ok(json)])
    }

    pub fn always_error(error: TransportError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of fetches made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// URLs requested, in order
    pub fn requested_urls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl DatasetTransport for FakeTransport {
    fn fetch_json(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<serde_json::Value, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| TransportError::Http("fake transport poisoned".to_string()))?;

        match responses.len() {
            0 => Err(TransportError::Http("no scripted response".to_string())),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}

/// Routes each URL to its own fake; handy when one engine needs two feeds
pub struct RoutedFakeTransport {
    routes: Vec<(String, FakeTransport)>,
}

impl RoutedFakeTransport {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn route(mut self, url: impl Into<String>, transport: FakeTransport) -> Self {
        self.routes.push((url.into(), transport));
        self
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.routes
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, t)| t.call_count())
            .unwrap_or(0)
    }
}

impl Default for RoutedFakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetTransport for RoutedFakeTransport {
    fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError> {
        match self.routes.iter().find(|(u, _)| u == url) {
            Some((_, transport)) => transport.fetch_json(url, timeout),
            None => Err(TransportError::Http(format!("no route for {}", url))),
        }
    }
}
