//! SchemaVer: the MODEL-REVISION-ADDITION version attached to every Iglu schema

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IgluError, Result};

/// Grammar for a full SchemaVer string. Model starts at 1, no leading zeros anywhere.
const SCHEMAVER_PATTERN: &str = r"([1-9][0-9]*)-(0|[1-9][0-9]*)-(0|[1-9][0-9]*)";

fn schemaver_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(&format!("^{}$", SCHEMAVER_PATTERN)).expect("SchemaVer pattern is valid")
    })
}

/// A three-part schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVer {
    /// Incremented on breaking changes
    pub model: u32,
    /// Incremented on changes that may break some historical data
    pub revision: u32,
    /// Incremented on changes compatible with all historical data
    pub addition: u32,
}

impl SchemaVer {
    pub fn new(model: u32, revision: u32, addition: u32) -> Self {
        Self { model, revision, addition }
    }

    /// Parse `MODEL-REVISION-ADDITION`. The whole string must match.
    ///
    /// Components are bounded to `u32`; a grammatical value above `u32::MAX`
    /// (e.g. `4294967296-0-0`) is a `MalformedVersion`.
    pub fn parse(version: &str) -> Result<Self> {
        let captures = schemaver_regex()
            .captures(version)
            .ok_or_else(|| IgluError::MalformedVersion(version.to_string()))?;

        let component = |idx: usize| -> Result<u32> {
            captures[idx]
                .parse()
                .map_err(|_| IgluError::MalformedVersion(version.to_string()))
        };

        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }

    /// Render as `MODEL-REVISION-ADDITION`
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SchemaVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.model, self.revision, self.addition)
    }
}

impl FromStr for SchemaVer {
    type Err = IgluError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SchemaVer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_digit_versions() {
        assert_eq!(SchemaVer::parse("2-0-3").unwrap(), SchemaVer::new(2, 0, 3));
    }

    #[test]
    fn test_multiple_digit_versions() {
        assert_eq!(SchemaVer::parse("10-0-112").unwrap(), SchemaVer::new(10, 0, 112));
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for bad in ["10-a-1", "a-b-c", "A-B-C", "2.0.3", "0-1-0", "01-0-0", "1-00-0", "1-0", "1-0-0-0", " 1-0-0", ""] {
            match SchemaVer::parse(bad) {
                Err(IgluError::MalformedVersion(v)) => assert_eq!(v, bad),
                other => panic!("expected MalformedVersion for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_rejects_overflowing_component() {
        assert_eq!(
            SchemaVer::parse("4294967295-0-4294967295").unwrap(),
            SchemaVer::new(u32::MAX, 0, u32::MAX)
        );
        for bad in ["4294967296-0-0", "1-4294967296-0", "99999999999-0-0"] {
            assert!(matches!(SchemaVer::parse(bad), Err(IgluError::MalformedVersion(_))));
        }
    }

    #[test]
    fn test_formatting() {
        assert_eq!(SchemaVer::new(1, 0, 12).as_string(), "1-0-12");
        assert_eq!(SchemaVer::new(3, 10, 0).to_string(), "3-10-0");
    }

    #[test]
    fn test_ordering() {
        let mut versions = vec![
            SchemaVer::new(2, 0, 0),
            SchemaVer::new(1, 0, 10),
            SchemaVer::new(1, 1, 0),
            SchemaVer::new(1, 0, 2),
        ];
        versions.sort();
        assert_eq!(
            versions.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["1-0-2", "1-0-10", "1-1-0", "2-0-0"]
        );
    }

    #[test]
    fn test_serde_as_string() {
        let v = SchemaVer::new(1, 2, 3);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"1-2-3\"");
        let back: SchemaVer = serde_json::from_str("\"1-2-3\"").unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<SchemaVer>("\"1.2.3\"").is_err());
    }
}
