//! Resolver: cascading schema lookup over prioritized registries
//!
//! ## Lookup
//!
//! 1. Serve from the cache when the entry is younger than the TTL (or no TTL is set)
//! 2. Otherwise visit registries ordered by
//!    `(vendor mismatch, class priority, configured priority)`
//! 3. The first registry returning a schema wins; its answer is cached
//! 4. If none does, fail with every attempt in visiting order
//!
//! Lookups issued concurrently for the same key are coalesced: one caller runs
//! the cascade while the others wait and then read the cache.

mod cache;
mod clock;
mod document;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{
    ConnectionConfig, EmbeddedConnection, HttpConnection, RepositoryConfig, ResolverConfig,
};

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{IgluError, LookupAttempt, ResolutionError, Result};
use crate::key::SchemaKey;
use crate::registry::{bootstrap, RegistryRef};
use crate::self_describing::{data_of, schema_key_of};
use crate::validation;

use cache::SchemaCache;

const CONFIG_VENDOR: &str = "com.snowplowanalytics.iglu";
const CONFIG_NAME: &str = "resolver-config";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves schema keys against an ordered set of registries
pub struct Resolver {
    registries: Vec<RegistryRef>,
    cache: Mutex<SchemaCache>,
    cache_ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    /// One gate per key with a cascade in progress
    in_flight: Mutex<HashMap<SchemaKey, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registries", &self.registries)
            .field("cache_ttl", &self.cache_ttl)
            .field("cached", &self.cache_len())
            .finish()
    }
}

impl Resolver {
    /// Create a resolver. The bootstrap registry is always placed first.
    pub fn new(registries: Vec<RegistryRef>, cache_ttl: Option<Duration>) -> Self {
        let mut all = Vec::with_capacity(registries.len() + 1);
        all.push(bootstrap().clone());
        all.extend(registries);

        Self {
            registries: all,
            cache: Mutex::new(SchemaCache::new(None)),
            cache_ttl,
            clock: Arc::new(SystemClock),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Bound the cache to `capacity` entries (`Some(0)` disables caching)
    pub fn with_cache_size(self, capacity: Option<usize>) -> Self {
        *lock(&self.cache) = SchemaCache::new(capacity);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build a resolver from a self-describing resolver configuration
    pub fn parse(config: &Value) -> Result<Self> {
        Self::parse_with(config, &ClientConfig::default())
    }

    /// Same as [`parse`](Self::parse), applying client settings to HTTP registries
    pub fn parse_with(config: &Value, settings: &ClientConfig) -> Result<Self> {
        let key = schema_key_of(config)?;
        let data = data_of(config)?;

        if key.vendor != CONFIG_VENDOR || key.name != CONFIG_NAME {
            return Err(IgluError::MalformedInstance(format!(
                "{} is not a resolver configuration schema",
                key
            )));
        }

        let schema = bootstrap()
            .lookup_schema(&key)
            .map_err(|e| IgluError::Config(format!("cannot read bundled {}: {}", key, e)))?
            .ok_or_else(|| {
                IgluError::Config(format!("resolver configuration {} is not supported", key))
            })?;
        validation::validate(&key.as_uri(), &schema, data)?;

        let document: ResolverConfig = serde_json::from_value(data.clone())
            .map_err(|e| IgluError::MalformedInstance(format!("resolver configuration: {}", e)))?;

        let registries = document
            .repositories
            .iter()
            .map(|repository| repository.to_registry(&settings.http))
            .collect::<Result<Vec<_>>>()?;

        info!(
            config = %key,
            registries = registries.len(),
            cache_size = document.cache_capacity(),
            cache_ttl = ?document.cache_ttl(),
            "resolver configured"
        );

        Ok(Self::new(registries, document.cache_ttl())
            .with_cache_size(Some(document.cache_capacity())))
    }

    /// Read and parse a resolver configuration file
    pub fn from_path(path: impl AsRef<Path>, settings: &ClientConfig) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Value = serde_json::from_str(&content)?;
        Self::parse_with(&config, settings)
    }

    /// All registries, bootstrap first
    pub fn registries(&self) -> &[RegistryRef] {
        &self.registries
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    pub fn cache_size(&self) -> Option<usize> {
        lock(&self.cache).capacity()
    }

    /// Number of cached schemas
    pub fn cache_len(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    /// Registries in the order they will be visited for `key`
    pub fn prioritize(&self, key: &SchemaKey) -> Vec<&RegistryRef> {
        let mut ordered: Vec<&RegistryRef> = self.registries.iter().collect();
        ordered.sort_by(|a, b| {
            (!a.vendor_matched(key), a.class_priority())
                .cmp(&(!b.vendor_matched(key), b.class_priority()))
                .then_with(|| a.config().priority.total_cmp(&b.config().priority))
        });
        ordered
    }

    /// Look up a schema given as an Iglu URI
    pub fn lookup_schema_uri(&self, uri: &str) -> Result<Arc<Value>> {
        let key = SchemaKey::parse(uri)?;
        self.lookup_schema(&key)
    }

    /// Look up a schema, from cache or by cascading through the registries
    pub fn lookup_schema(&self, key: &SchemaKey) -> Result<Arc<Value>> {
        if let Some(schema) = self.cached(key) {
            debug!(%key, "cache hit");
            return Ok(schema);
        }

        let gate = Arc::clone(lock(&self.in_flight).entry(key.clone()).or_default());
        let result = {
            let _guard = lock(&*gate);
            // Another caller may have completed the cascade while we waited
            match self.cached(key) {
                Some(schema) => Ok(schema),
                None => self.cascade(key),
            }
        };

        let mut in_flight = lock(&self.in_flight);
        // Only the map and this call still hold the gate
        if Arc::strong_count(&gate) == 2 {
            in_flight.remove(key);
        }
        result
    }

    /// Validate a self-describing JSON instance against its resolved schema
    pub fn validate(&self, instance: &Value) -> Result<()> {
        let key = schema_key_of(instance)?;
        let data = data_of(instance)?;
        let schema = self.lookup_schema(&key)?;
        validation::validate(&key.as_uri(), &schema, data)
    }

    fn cached(&self, key: &SchemaKey) -> Option<Arc<Value>> {
        let now = self.clock.now();
        lock(&self.cache).get(key, now, self.cache_ttl)
    }

    fn cascade(&self, key: &SchemaKey) -> Result<Arc<Value>> {
        let mut attempts = Vec::new();

        for registry in self.prioritize(key) {
            debug!(%key, registry = registry.name(), kind = registry.descriptor(), "looking up");
            match registry.lookup_schema(key) {
                Ok(Some(schema)) => {
                    let schema = Arc::new(schema);
                    let now = self.clock.now();
                    lock(&self.cache).insert(key.clone(), Arc::clone(&schema), now);
                    debug!(%key, registry = registry.name(), "resolved");
                    return Ok(schema);
                }
                Ok(None) => attempts.push(LookupAttempt::NotFound {
                    registry: registry.name().to_string(),
                }),
                Err(reason) => {
                    warn!(%key, registry = registry.name(), error = %reason, "lookup failed");
                    attempts.push(LookupAttempt::LookupFailure {
                        registry: registry.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Err(ResolutionError {
            schema_key: key.clone(),
            attempts,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{EmbeddedRegistry, RegistryRefConfig, BOOTSTRAP_NAME};
    use crate::version::SchemaVer;
    use serde_json::json;
    use tempfile::tempdir;

    fn key(vendor: &str) -> SchemaKey {
        SchemaKey::new(vendor, "event", "jsonschema", SchemaVer::new(1, 0, 0))
    }

    fn embedded(name: &str, priority: f64, prefixes: &[&str], root: &Path) -> RegistryRef {
        let config = RegistryRefConfig::new(
            name,
            priority,
            prefixes.iter().map(|p| p.to_string()).collect(),
        );
        EmbeddedRegistry::from_path(config, root).into()
    }

    #[test]
    fn test_bootstrap_is_prepended() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(vec![embedded("local", 1.0, &[], dir.path())], None);
        assert_eq!(resolver.registries().len(), 2);
        assert_eq!(resolver.registries()[0].name(), BOOTSTRAP_NAME);
        assert_eq!(resolver.registries()[1].name(), "local");
    }

    #[test]
    fn test_prioritize_orders_by_vendor_then_class_then_priority() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(
            vec![
                embedded("low", 10.0, &[], dir.path()),
                embedded("high", 2.0, &[], dir.path()),
                embedded("acme", 50.0, &["com.acme"], dir.path()),
            ],
            None,
        );

        let order: Vec<&str> = resolver
            .prioritize(&key("com.acme.web"))
            .into_iter()
            .map(RegistryRef::name)
            .collect();
        assert_eq!(order, vec!["acme", BOOTSTRAP_NAME, "high", "low"]);

        let order: Vec<&str> = resolver
            .prioritize(&key("org.other"))
            .into_iter()
            .map(RegistryRef::name)
            .collect();
        assert_eq!(order, vec![BOOTSTRAP_NAME, "high", "low", "acme"]);
    }

    #[test]
    fn test_equal_sort_keys_keep_declaration_order() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(
            vec![
                embedded("first", 5.0, &[], dir.path()),
                embedded("second", 5.0, &[], dir.path()),
            ],
            None,
        );
        let order: Vec<&str> = resolver
            .prioritize(&key("com.acme"))
            .into_iter()
            .map(RegistryRef::name)
            .collect();
        assert_eq!(order, vec![BOOTSTRAP_NAME, "first", "second"]);
    }

    #[test]
    fn test_lookup_by_uri_rejects_bad_key() {
        let resolver = Resolver::new(vec![], None);
        assert!(matches!(
            resolver.lookup_schema_uri("iglu:com.acme/event/jsonschema/1-a-1"),
            Err(IgluError::MalformedSchemaKey { .. })
        ));
    }

    #[test]
    fn test_bootstrap_answers_without_user_registries() {
        let resolver = Resolver::new(vec![], None);
        let schema = resolver
            .lookup_schema_uri("iglu:com.snowplowanalytics.iglu/resolver-config/jsonschema/1-0-0")
            .unwrap();
        assert_eq!(schema["self"]["name"], "resolver-config");
        assert_eq!(resolver.cache_len(), 1);
    }

    #[test]
    fn test_validate_requires_envelope() {
        let resolver = Resolver::new(vec![], None);
        assert!(matches!(
            resolver.validate(&json!({"data": {}})),
            Err(IgluError::MalformedInstance(_))
        ));
        assert!(matches!(
            resolver.validate(&json!({"schema": "iglu:com.acme/event/jsonschema/1-0-0"})),
            Err(IgluError::MalformedInstance(_))
        ));
    }

    #[test]
    fn test_parse_rejects_foreign_schema() {
        let config = json!({
            "schema": "iglu:com.acme/resolver/jsonschema/1-0-0",
            "data": {"cacheSize": 1, "repositories": []}
        });
        assert!(matches!(Resolver::parse(&config), Err(IgluError::MalformedInstance(_))));
    }
}
