//! JSON Schema validation of instance payloads

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::error::{IgluError, Result};

/// Validate `instance` against `schema`. Self-describing schemas are Draft 4.
///
/// `schema_key` only labels the error.
pub fn validate(schema_key: &str, schema: &Value, instance: &Value) -> Result<()> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft4)
        .compile(schema)
        .map_err(|e| IgluError::Validation {
            schema_key: schema_key.to_string(),
            errors: vec![format!("schema does not compile: {}", e)],
        })?;

    let result = compiled.validate(instance);
    if let Err(errors) = result {
        let errors = errors
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect::<Vec<_>>();
        return Err(IgluError::Validation {
            schema_key: schema_key.to_string(),
            errors,
        });
    }
    Ok(())
}
