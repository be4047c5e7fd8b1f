//! Registries served over HTTP

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::RegistryRefConfig;
use crate::config::HttpSettings;
use crate::error::RegistryError;
use crate::key::SchemaKey;

/// Header carrying the registry api key
pub const API_KEY_HEADER: &str = "apikey";

/// A single GET issued against a registry
#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    pub url: &'a str,
    pub timeout: Duration,
    pub api_key: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// How a transport-level failure is classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, ... Not retried.
    Unreachable(String),
    /// The request or response timed out. Retried.
    Timeout(String),
    Other(String),
}

/// Issues GET requests. The default implementation is [`ReqwestTransport`].
pub trait HttpTransport: Send + Sync {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

/// Blocking `reqwest` transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, RegistryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(request.url).timeout(request.timeout);
        if let Some(key) = request.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Unreachable(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

/// Registry reachable at `<uri>/schemas/...`
#[derive(Clone)]
pub struct HttpRegistry {
    pub config: RegistryRefConfig,
    uri: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for HttpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRegistry")
            .field("config", &self.config)
            .field("uri", &self.uri)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl HttpRegistry {
    /// Build a registry using the blocking `reqwest` transport
    pub fn new(
        config: RegistryRefConfig,
        uri: impl Into<String>,
        settings: &HttpSettings,
    ) -> Result<Self, RegistryError> {
        let transport = Arc::new(ReqwestTransport::new(&settings.user_agent)?);
        Ok(Self::with_transport(config, uri, transport).with_settings(settings))
    }

    /// Build a registry over any transport, with a 3s timeout and 3 retries
    pub fn with_transport(
        config: RegistryRefConfig,
        uri: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let defaults = HttpSettings::default();
        Self {
            config,
            uri: uri.into(),
            api_key: None,
            timeout: defaults.timeout(),
            max_retries: defaults.max_retries,
            transport,
        }
    }

    pub fn with_settings(mut self, settings: &HttpSettings) -> Self {
        self.timeout = settings.timeout();
        self.max_retries = settings.max_retries;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn schema_url(&self, key: &SchemaKey) -> String {
        format!("{}/schemas/{}", self.uri.trim_end_matches('/'), key.as_path())
    }

    /// GET the schema. Timeouts are retried up to `max_retries` times with no
    /// delay in between; unreachable registries fail straight away.
    pub fn lookup_schema(&self, key: &SchemaKey) -> Result<Option<Value>, RegistryError> {
        let url = self.schema_url(key);
        let request = HttpRequest {
            url: &url,
            timeout: self.timeout,
            api_key: self.api_key.as_deref(),
        };

        let mut attempts = 0;
        let response = loop {
            attempts += 1;
            match self.transport.get(&request) {
                Ok(response) => break response,
                Err(TransportError::Timeout(reason)) if attempts <= self.max_retries => {
                    warn!(registry = %self.config.name, %url, attempt = attempts, %reason, "timed out, retrying");
                }
                Err(TransportError::Timeout(reason)) => {
                    return Err(RegistryError::Timeout { attempts, reason });
                }
                Err(TransportError::Unreachable(reason)) => {
                    return Err(RegistryError::Unavailable {
                        registry: self.config.name.clone(),
                        reason,
                    });
                }
                Err(TransportError::Other(reason)) => return Err(RegistryError::Http(reason)),
            }
        };

        if response.status != 200 {
            debug!(registry = %self.config.name, %url, status = response.status, "schema not served");
            return Ok(None);
        }

        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| RegistryError::InvalidDocument(format!("{}: {}", url, e)))
    }
}
