//! Ordered feature schema: the single source of truth for vector positions.

use crate::error::SchemaError;
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

/// Ordered, duplicate-free list of feature names the model was trained on.
///
/// The order must match the artifact's training order. That contract cannot
/// be checked here; the schema is trusted as loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from raw names: trims whitespace and drops empty or
    /// repeated names, keeping the first occurrence.
    pub fn from_names<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if !seen.insert(name.to_string()) {
                log::debug!("dropping duplicate feature name '{name}'");
                continue;
            }
            out.push(name.to_string());
        }
        if out.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(Self { names: out })
    }

    /// Parse a JSON array of feature names
    pub fn from_json_str(source_name: &str, s: &str) -> Result<Self, SchemaError> {
        let names: Vec<String> = serde_json::from_str(s).map_err(|e| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_names(names)
    }

    /// Load the schema from a JSON file such as `feature_order.json`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let s = read_to_string(path).map_err(|e| SchemaError::Load {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        let schema = Self::from_json_str(&source_name, &s)?;
        log::info!(
            "loaded feature schema with {} features from {source_name}",
            schema.len()
        );
        Ok(schema)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed schema; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}
