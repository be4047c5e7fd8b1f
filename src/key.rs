//! Schema identifiers: `iglu:vendor/name/format/MODEL-REVISION-ADDITION`

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IgluError, Result};
use crate::version::SchemaVer;

const URI_PREFIX: &str = "iglu:";

fn uri_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // The version group is deliberately loose; SchemaVer::parse owns that grammar
    REGEX.get_or_init(|| {
        Regex::new(r"^iglu:([a-zA-Z0-9\-_.]+)/([a-zA-Z0-9\-_]+)/([a-zA-Z0-9\-_]+)/([^/]+)$")
            .expect("Iglu URI pattern is valid")
    })
}

/// Fully-qualified name of a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    pub vendor: String,
    pub name: String,
    pub format: String,
    pub version: SchemaVer,
}

impl SchemaKey {
    pub fn new(
        vendor: impl Into<String>,
        name: impl Into<String>,
        format: impl Into<String>,
        version: SchemaVer,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            name: name.into(),
            format: format.into(),
            version,
        }
    }

    /// Parse an Iglu URI such as `iglu:com.acme/event/jsonschema/1-0-0`
    pub fn parse(key: &str) -> Result<Self> {
        let malformed = |source: Option<IgluError>| IgluError::MalformedSchemaKey {
            key: key.to_string(),
            source: source.map(Box::new),
        };

        let captures = uri_regex().captures(key).ok_or_else(|| malformed(None))?;
        let version = SchemaVer::parse(&captures[4]).map_err(|e| malformed(Some(e)))?;

        Ok(Self::new(&captures[1], &captures[2], &captures[3], version))
    }

    /// Render as Iglu URI (with `iglu:`)
    pub fn as_uri(&self) -> String {
        format!("{}{}", URI_PREFIX, self.as_path())
    }

    /// Render as plain path, as used by registries
    pub fn as_path(&self) -> String {
        format!("{}/{}/{}/{}", self.vendor, self.name, self.format, self.version)
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URI_PREFIX, self.as_path())
    }
}

impl FromStr for SchemaKey {
    type Err = IgluError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SchemaKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
