//! Iglu Client
//!
//! Resolves Iglu schema keys against an ordered set of schema registries and
//! validates self-describing JSON against the resolved schemas.
//!
//! ## Features
//!
//! - **Strict identifiers**: `iglu:vendor/name/format/MODEL-REVISION-ADDITION`
//! - **Prioritized cascade**: vendor-matched registries first, embedded before HTTP,
//!   then configured priority
//! - **Caching**: in-memory, optional TTL, bounded by `cacheSize`
//! - **Failure aggregation**: a failed lookup reports what every registry said
//! - **Bootstrap registry**: the resolver's own configuration schemas are compiled in
//!
//! ## Example
//!
//! ```no_run
//! use iglu_client::Resolver;
//! use serde_json::json;
//!
//! let resolver = Resolver::parse(&json!({
//!     "schema": "iglu:com.snowplowanalytics.iglu/resolver-config/jsonschema/1-0-0",
//!     "data": {
//!         "cacheSize": 500,
//!         "repositories": [{
//!             "name": "Iglu Central",
//!             "priority": 0,
//!             "vendorPrefixes": ["com.snowplowanalytics"],
//!             "connection": { "http": { "uri": "http://iglucentral.com" } }
//!         }]
//!     }
//! }))?;
//!
//! let schema = resolver.lookup_schema_uri("iglu:com.snowplowanalytics.snowplow/link_click/jsonschema/1-0-1")?;
//! # Ok::<(), iglu_client::IgluError>(())
//! ```
//!
//! ## Registry layout
//!
//! ```text
//! <root>/
//! └── schemas/
//!     └── com.acme/
//!         └── link_click/
//!             └── jsonschema/
//!                 ├── 1-0-0
//!                 └── 1-0-1
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod registry;
pub mod resolver;
pub mod self_describing;
pub mod validation;
pub mod version;

pub use config::ClientConfig;
pub use error::{IgluError, LookupAttempt, RegistryError, ResolutionError, Result};
pub use key::SchemaKey;
pub use registry::{bootstrap, EmbeddedRegistry, HttpRegistry, RegistryRef, RegistryRefConfig};
pub use resolver::Resolver;
pub use self_describing::SelfDescribingJson;
pub use version::SchemaVer;
