//! Artifact trait and error types for single-row inference

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by a model artifact while loading or scoring
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Model loading failed: {0}")]
    LoadError(String),
    #[error("Inference failed: {0}")]
    InferenceError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// One cell of an ordered feature row.
///
/// Categorical answers travel as text, everything else as a number; the
/// artifact decides how each column is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(x) => Some(*x),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(x) => write!(f, "{x}"),
            FeatureValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(x: f64) -> Self {
        FeatureValue::Number(x)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Text(s)
    }
}

/// A trained binary classifier consuming one positional feature row.
///
/// Implementations must be pure functions of the row: the same input always
/// yields the same output, and no state is mutated by scoring.
pub trait ModelArtifact: Send + Sync {
    /// Class probabilities `[p(class=0), p(class=1)]`
    fn predict_proba(&self, row: &[FeatureValue]) -> Result<Vec<f64>, BackendError>;

    /// Predicted class label
    fn predict(&self, row: &[FeatureValue]) -> Result<i64, BackendError>;

    /// Artifact name/identifier used in diagnostics
    fn artifact_name(&self) -> &str;

    /// Column names in training order, when the artifact records them
    fn feature_names(&self) -> Option<Vec<&str>> {
        None
    }
}
