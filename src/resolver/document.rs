//! The `data` part of a resolver configuration document

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::HttpSettings;
use crate::error::{IgluError, Result};
use crate::registry::{EmbeddedRegistry, HttpRegistry, RegistryRef, RegistryRefConfig};

/// Resolver configuration payload (resolver-config 1-0-0 through 1-0-2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    pub cache_size: f64,
    /// Seconds. Absent or null means entries never expire.
    #[serde(default)]
    pub cache_ttl: Option<u64>,
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub name: String,
    pub priority: f64,
    pub vendor_prefixes: Vec<String>,
    pub connection: ConnectionConfig,
}

/// Exactly one of the two must be present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedConnection {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConnection {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apikey: Option<String>,
}

impl ResolverConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl.map(Duration::from_secs)
    }

    /// `cacheSize` as an entry bound. Negative or non-finite sizes disable caching.
    pub fn cache_capacity(&self) -> usize {
        if self.cache_size.is_finite() && self.cache_size > 0.0 {
            self.cache_size as usize
        } else {
            0
        }
    }
}

impl RepositoryConfig {
    pub fn registry_config(&self) -> RegistryRefConfig {
        RegistryRefConfig::new(self.name.clone(), self.priority, self.vendor_prefixes.clone())
    }

    pub fn to_registry(&self, http: &HttpSettings) -> Result<RegistryRef> {
        let config = self.registry_config();
        match (&self.connection.embedded, &self.connection.http) {
            (Some(embedded), None) => Ok(EmbeddedRegistry::from_path(config, &embedded.path).into()),
            (None, Some(conn)) => {
                let registry = HttpRegistry::new(config, conn.uri.clone(), http)
                    .map_err(|e| IgluError::Config(format!("registry {}: {}", self.name, e)))?
                    .with_api_key(conn.apikey.clone());
                Ok(registry.into())
            }
            _ => Err(IgluError::MalformedInstance(format!(
                "incorrect RegistryRef {}: connection must be exactly one of embedded or http",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repository(connection: serde_json::Value) -> RepositoryConfig {
        serde_json::from_value(json!({
            "name": "Repo",
            "priority": 3,
            "vendorPrefixes": ["com.acme"],
            "connection": connection
        }))
        .unwrap()
    }

    #[test]
    fn test_embedded_connection() {
        let registry = repository(json!({"embedded": {"path": "/var/iglu"}}))
            .to_registry(&HttpSettings::default())
            .unwrap();
        assert_eq!(registry.descriptor(), "embedded");
        assert_eq!(registry.config().priority, 3.0);
    }

    #[test]
    fn test_http_connection() {
        let registry = repository(json!({"http": {"uri": "http://iglu.acme.com", "apikey": "k"}}))
            .to_registry(&HttpSettings::default())
            .unwrap();
        match registry {
            RegistryRef::Http(http) => assert_eq!(http.uri(), "http://iglu.acme.com"),
            other => panic!("expected HTTP registry, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_without_variant_is_malformed() {
        let result = repository(json!({})).to_registry(&HttpSettings::default());
        assert!(matches!(result, Err(IgluError::MalformedInstance(_))));
    }

    #[test]
    fn test_cache_settings() {
        let config: ResolverConfig = serde_json::from_value(json!({
            "cacheSize": 500,
            "cacheTtl": null,
            "repositories": []
        }))
        .unwrap();
        assert_eq!(config.cache_capacity(), 500);
        assert_eq!(config.cache_ttl(), None);

        let config: ResolverConfig = serde_json::from_value(json!({
            "cacheSize": -1,
            "cacheTtl": 600,
            "repositories": []
        }))
        .unwrap();
        assert_eq!(config.cache_capacity(), 0);
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(600)));
    }
}
