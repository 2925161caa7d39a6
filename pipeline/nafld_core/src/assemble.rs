//! Maps name-keyed form values onto the ordered vector the model expects.
//!
//! Validation happens here and only here. Once a [`PredictionRequest`] exists,
//! its values are positional and nothing downstream looks them up by name.

use crate::catalog::{FieldCatalog, FieldSpec};
use crate::error::ValidationError;
use crate::schema::FeatureSchema;
use nafld_model::FeatureValue;
use serde_json::Value as JsonValue;

/// Loosely-typed values keyed by feature name, as produced by a form
pub type NamedValues = serde_json::Map<String, JsonValue>;

/// Validated feature row, one value per schema position in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    values: Vec<FeatureValue>,
}

impl PredictionRequest {
    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read the row back as a name-keyed mapping, in schema order
    pub fn to_named(&self, schema: &FeatureSchema) -> NamedValues {
        schema
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.to_string(), feature_to_json(value)))
            .collect()
    }
}

fn feature_to_json(value: &FeatureValue) -> JsonValue {
    match value {
        FeatureValue::Number(x) => serde_json::Number::from_f64(*x)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        FeatureValue::Text(s) => JsonValue::String(s.clone()),
    }
}

fn describe(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric(field: &str, value: &JsonValue) -> Result<f64, ValidationError> {
    match value.as_f64() {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: "a number",
            found: value.to_string(),
        }),
    }
}

/// Check one raw value against its field's domain
pub fn validate_field(
    field: &str,
    spec: &FieldSpec,
    value: &JsonValue,
) -> Result<FeatureValue, ValidationError> {
    match spec {
        FieldSpec::Categorical { choices } => match value {
            JsonValue::String(s) if choices.iter().any(|c| c == s) => {
                Ok(FeatureValue::Text(s.clone()))
            }
            other => Err(ValidationError::InvalidCategory {
                field: field.to_string(),
                value: describe(other),
                allowed: choices.clone(),
            }),
        },
        FieldSpec::BoundedNumeric(range) => {
            let x = numeric(field, value)?;
            if !range.contains(x) {
                return Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    value: x,
                    minimum: range.minimum,
                    maximum: range.maximum,
                });
            }
            Ok(FeatureValue::Number(x))
        }
        FieldSpec::FreeNumeric => numeric(field, value).map(FeatureValue::Number),
    }
}

/// Validates named values against a schema and its field catalog
#[derive(Debug, Clone, Copy)]
pub struct InputAssembler<'a> {
    schema: &'a FeatureSchema,
    catalog: &'a FieldCatalog,
}

impl<'a> InputAssembler<'a> {
    pub fn new(schema: &'a FeatureSchema, catalog: &'a FieldCatalog) -> Self {
        Self { schema, catalog }
    }

    /// Produce the ordered vector, failing on the first invalid field in
    /// schema order. Names outside the schema are ignored.
    pub fn assemble(&self, named: &NamedValues) -> Result<PredictionRequest, ValidationError> {
        let mut values = Vec::with_capacity(self.schema.len());
        for name in self.schema.iter() {
            let raw = named
                .get(name)
                .ok_or_else(|| ValidationError::MissingField(name.to_string()))?;
            values.push(validate_field(name, self.catalog.spec_for(name), raw)?);
        }
        for extra in named.keys().filter(|k| !self.schema.contains(k)) {
            log::debug!("ignoring value for '{extra}', not in feature schema");
        }
        Ok(PredictionRequest { values })
    }

    /// Resolve positional values (one per schema feature) to names
    pub fn name_positional(&self, values: &[JsonValue]) -> Result<NamedValues, ValidationError> {
        if values.len() != self.schema.len() {
            return Err(ValidationError::ArityMismatch {
                expected: self.schema.len(),
                actual: values.len(),
            });
        }
        Ok(self
            .schema
            .iter()
            .zip(values.iter())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect())
    }

    /// Every schema field set to its catalog default
    pub fn defaults(&self) -> NamedValues {
        self.schema
            .iter()
            .map(|name| {
                let value = self.catalog.spec_for(name).default_value();
                (name.to_string(), feature_to_json(&value))
            })
            .collect()
    }
}
