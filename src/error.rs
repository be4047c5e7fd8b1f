//! Error types for the Iglu client

use std::fmt;

use thiserror::Error;

use crate::key::SchemaKey;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, IgluError>;

/// Errors surfaced by the public client API
#[derive(Error, Debug)]
pub enum IgluError {
    #[error("Invalid SchemaVer: {0}")]
    MalformedVersion(String),

    #[error("Schema key [{key}] is not valid Iglu URI")]
    MalformedSchemaKey {
        key: String,
        #[source]
        source: Option<Box<IgluError>>,
    },

    #[error("JSON instance is not self-describing: {0}")]
    MalformedInstance(String),

    #[error("Instance is invalid against {schema_key}: {}", .errors.join("; "))]
    Validation {
        schema_key: String,
        errors: Vec<String>,
    },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IgluError {
    /// True when the error came from the validator rather than from resolution or parsing
    pub fn is_validation(&self) -> bool {
        matches!(self, IgluError::Validation { .. })
    }
}

/// Failure of a single registry during a lookup
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Iglu registry {registry} is not available: {reason}")]
    Unavailable { registry: String, reason: String },

    #[error("Request timed out after {attempts} attempts: {reason}")]
    Timeout { attempts: u32, reason: String },

    #[error("Invalid schema document: {0}")]
    InvalidDocument(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One registry's contribution to a failed cascade
#[derive(Debug)]
pub enum LookupAttempt {
    /// The registry answered and does not hold the schema
    NotFound { registry: String },
    /// The registry could not answer
    LookupFailure {
        registry: String,
        reason: RegistryError,
    },
}

impl LookupAttempt {
    pub fn registry(&self) -> &str {
        match self {
            LookupAttempt::NotFound { registry } => registry,
            LookupAttempt::LookupFailure { registry, .. } => registry,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupAttempt::NotFound { .. })
    }
}

impl fmt::Display for LookupAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupAttempt::NotFound { registry } => write!(f, "{}: not found", registry),
            LookupAttempt::LookupFailure { registry, reason } => {
                write!(f, "{}: {}", registry, reason)
            }
        }
    }
}

/// Every registry in the cascade was tried and none produced the schema
#[derive(Error, Debug)]
#[error("Schema {schema_key} could not be resolved: [{}]", format_attempts(.attempts))]
pub struct ResolutionError {
    pub schema_key: SchemaKey,
    pub attempts: Vec<LookupAttempt>,
}

fn format_attempts(attempts: &[LookupAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SchemaVer;

    #[test]
    fn test_resolution_error_lists_attempts() {
        let err = ResolutionError {
            schema_key: SchemaKey::new("com.acme", "event", "jsonschema", SchemaVer::new(1, 0, 0)),
            attempts: vec![
                LookupAttempt::NotFound { registry: "Local".to_string() },
                LookupAttempt::LookupFailure {
                    registry: "Central".to_string(),
                    reason: RegistryError::Timeout { attempts: 4, reason: "read".to_string() },
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("iglu:com.acme/event/jsonschema/1-0-0"));
        assert!(message.contains("Local: not found"));
        assert!(message.contains("Central: Request timed out after 4 attempts"));
    }
}
