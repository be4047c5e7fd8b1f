//! Self-describing JSON: `{"schema": "iglu:...", "data": ...}`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{IgluError, Result};
use crate::key::SchemaKey;
use crate::resolver::Resolver;

/// A payload paired with the key of the schema describing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfDescribingJson {
    pub schema: SchemaKey,
    pub data: Value,
    #[serde(skip)]
    valid: bool,
}

impl SelfDescribingJson {
    pub fn new(schema: SchemaKey, data: Value) -> Self {
        Self {
            schema,
            data,
            valid: false,
        }
    }

    /// Split an envelope into key and payload
    pub fn parse_json(json: &Value) -> Result<Self> {
        let schema = schema_key_of(json)?;
        let data = data_of(json)?;
        Ok(Self::new(schema, data.clone()))
    }

    pub fn to_json(&self) -> Value {
        json!({
            "schema": self.schema.as_uri(),
            "data": self.data,
        })
    }

    /// Validate against the resolved schema. Success is remembered.
    pub fn validate(&mut self, resolver: &Resolver) -> Result<()> {
        let schema = resolver.lookup_schema(&self.schema)?;
        crate::validation::validate(&self.schema.as_uri(), &schema, &self.data)?;
        self.valid = true;
        Ok(())
    }

    /// Like [`validate`](Self::validate), but a schema violation is `Ok(false)`.
    /// Resolution failures are still errors.
    pub fn is_valid(&mut self, resolver: &Resolver) -> Result<bool> {
        if self.valid {
            return Ok(true);
        }
        match self.validate(resolver) {
            Ok(()) => Ok(true),
            Err(e) if e.is_validation() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Extract and parse the `schema` field of an envelope
pub(crate) fn schema_key_of(json: &Value) -> Result<SchemaKey> {
    match json.get("schema") {
        Some(Value::String(uri)) => SchemaKey::parse(uri),
        Some(Value::Null) | None => Err(IgluError::MalformedInstance(format!(
            "schema property is absent: {}",
            json
        ))),
        Some(other) => Err(IgluError::MalformedInstance(format!(
            "schema property must be a string, got {}",
            other
        ))),
    }
}

/// Borrow the `data` field of an envelope
pub(crate) fn data_of(json: &Value) -> Result<&Value> {
    match json.get("data") {
        Some(Value::Null) | None => Err(IgluError::MalformedInstance(format!(
            "data property is absent: {}",
            json
        ))),
        Some(data) => Ok(data),
    }
}
