//! Schema registries
//!
//! A registry answers one question: "do you hold the document for this key?"
//! Two kinds exist:
//!
//! - [`EmbeddedRegistry`] reads `schemas/<vendor>/<name>/<format>/<version>`
//!   below a root that is either a directory on disk or a tree compiled into
//!   the binary.
//! - [`HttpRegistry`] issues `GET <uri>/schemas/<vendor>/<name>/<format>/<version>`
//!   with a per-request timeout and a bounded retry on timeouts.
//!
//! Lookups return `Ok(Some(schema))` when found, `Ok(None)` when the registry
//! definitively does not hold the key, and `Err(_)` when it could not answer.

mod bootstrap;
mod embedded;
mod http;

pub use bootstrap::{bootstrap, BOOTSTRAP_NAME};
pub use embedded::{EmbeddedRegistry, EmbeddedSource};
pub use http::{
    HttpRegistry, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;
use crate::key::SchemaKey;

/// Class priority of embedded registries. Lower wins.
pub const EMBEDDED_CLASS_PRIORITY: u32 = 1;
/// Class priority of HTTP registries
pub const HTTP_CLASS_PRIORITY: u32 = 100;

/// Static metadata shared by every registry kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRefConfig {
    /// Human-readable name, used in diagnostics
    pub name: String,
    /// Configured priority, any JSON number. Lower is tried first.
    pub priority: f64,
    /// Vendors this registry is authoritative for
    pub vendor_prefixes: Vec<String>,
}

impl RegistryRefConfig {
    pub fn new(
        name: impl Into<String>,
        priority: impl Into<f64>,
        vendor_prefixes: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority: priority.into(),
            vendor_prefixes,
        }
    }
}

/// A configured registry
#[derive(Debug, Clone)]
pub enum RegistryRef {
    Embedded(EmbeddedRegistry),
    Http(HttpRegistry),
}

impl RegistryRef {
    pub fn config(&self) -> &RegistryRefConfig {
        match self {
            RegistryRef::Embedded(r) => &r.config,
            RegistryRef::Http(r) => &r.config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config().name
    }

    /// Preference between registry kinds when vendor matching ties
    pub fn class_priority(&self) -> u32 {
        match self {
            RegistryRef::Embedded(_) => EMBEDDED_CLASS_PRIORITY,
            RegistryRef::Http(_) => HTTP_CLASS_PRIORITY,
        }
    }

    pub fn descriptor(&self) -> &'static str {
        match self {
            RegistryRef::Embedded(_) => "embedded",
            RegistryRef::Http(_) => "HTTP",
        }
    }

    /// True if the key's vendor starts with any configured prefix
    pub fn vendor_matched(&self, key: &SchemaKey) -> bool {
        self.config()
            .vendor_prefixes
            .iter()
            .any(|prefix| key.vendor.starts_with(prefix.as_str()))
    }

    pub fn lookup_schema(&self, key: &SchemaKey) -> Result<Option<Value>, RegistryError> {
        match self {
            RegistryRef::Embedded(r) => r.lookup_schema(key),
            RegistryRef::Http(r) => r.lookup_schema(key),
        }
    }
}

impl From<EmbeddedRegistry> for RegistryRef {
    fn from(registry: EmbeddedRegistry) -> Self {
        RegistryRef::Embedded(registry)
    }
}

impl From<HttpRegistry> for RegistryRef {
    fn from(registry: HttpRegistry) -> Self {
        RegistryRef::Http(registry)
    }
}
