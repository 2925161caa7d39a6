//! Fitted logistic-regression pipeline exported as JSON.
//!
//! The export mirrors a preprocessing + classifier pipeline: every column is
//! either standard-scaled (numeric) or one-hot encoded (categorical), each
//! encoded column carries its coefficient, and the sum plus intercept goes
//! through a sigmoid. Columns are stored in training order.

use crate::artifact::{BackendError, FeatureValue, ModelArtifact};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

fn default_threshold() -> f64 {
    0.5
}

/// Encoding applied to one input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTransform {
    /// `coef * (x - mean) / scale`
    Scaled {
        name: String,
        mean: f64,
        scale: f64,
        coef: f64,
    },
    /// One coefficient per known level; unknown levels are rejected
    OneHot {
        name: String,
        levels: BTreeMap<String, f64>,
    },
}

impl ColumnTransform {
    pub fn name(&self) -> &str {
        match self {
            ColumnTransform::Scaled { name, .. } | ColumnTransform::OneHot { name, .. } => name,
        }
    }

    fn contribution(&self, value: &FeatureValue) -> Result<f64, BackendError> {
        match (self, value) {
            (
                ColumnTransform::Scaled {
                    mean, scale, coef, ..
                },
                FeatureValue::Number(x),
            ) => Ok(coef * (x - mean) / scale),
            (ColumnTransform::OneHot { name, levels }, FeatureValue::Text(level)) => levels
                .get(level)
                .copied()
                .ok_or_else(|| {
                    BackendError::InvalidInput(format!("unknown level '{level}' for column {name}"))
                }),
            (ColumnTransform::Scaled { name, .. }, FeatureValue::Text(t)) => Err(
                BackendError::InvalidInput(format!("column {name} expects a number, got '{t}'")),
            ),
            (ColumnTransform::OneHot { name, .. }, FeatureValue::Number(x)) => Err(
                BackendError::InvalidInput(format!("column {name} expects a category, got {x}")),
            ),
        }
    }

    fn check(&self) -> Result<(), BackendError> {
        match self {
            ColumnTransform::Scaled {
                name,
                mean,
                scale,
                coef,
            } => {
                if !(mean.is_finite() && coef.is_finite()) {
                    return Err(BackendError::LoadError(format!(
                        "column {name}: mean and coef must be finite"
                    )));
                }
                if !scale.is_finite() || *scale == 0.0 {
                    return Err(BackendError::LoadError(format!(
                        "column {name}: scale must be finite and non-zero"
                    )));
                }
            }
            ColumnTransform::OneHot { name, levels } => {
                if levels.is_empty() {
                    return Err(BackendError::LoadError(format!(
                        "column {name}: one-hot column has no levels"
                    )));
                }
                if levels.values().any(|c| !c.is_finite()) {
                    return Err(BackendError::LoadError(format!(
                        "column {name}: level coefficients must be finite"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Logistic-regression pipeline loaded from a JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticPipeline {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub columns: Vec<ColumnTransform>,
}

impl LogisticPipeline {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let s = read_to_string(path)
            .map_err(|e| BackendError::LoadError(format!("read {}: {e}", path.display())))?;
        let pipeline = Self::from_json(&s)?;
        log::info!(
            "loaded model artifact '{}' ({} columns) from {}",
            pipeline.name,
            pipeline.columns.len(),
            path.display()
        );
        Ok(pipeline)
    }

    pub fn from_json(s: &str) -> Result<Self, BackendError> {
        let pipeline = serde_json::from_str::<LogisticPipeline>(s)
            .map_err(|e| BackendError::SerializationError(e.to_string()))?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    fn validate(&self) -> Result<(), BackendError> {
        if self.columns.is_empty() {
            return Err(BackendError::LoadError("pipeline has no columns".into()));
        }
        if !self.intercept.is_finite() {
            return Err(BackendError::LoadError("intercept must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(BackendError::LoadError(format!(
                "threshold {} outside [0,1]",
                self.threshold
            )));
        }
        self.columns.iter().try_for_each(ColumnTransform::check)
    }

    /// Positive-class probability for one row
    pub fn positive_probability(&self, row: &[FeatureValue]) -> Result<f64, BackendError> {
        if row.len() != self.columns.len() {
            return Err(BackendError::InvalidInput(format!(
                "expected {} features, got {}",
                self.columns.len(),
                row.len()
            )));
        }
        let mut logit = self.intercept;
        for (column, value) in self.columns.iter().zip(row.iter()) {
            logit += column.contribution(value)?;
        }
        Ok(sigmoid(logit))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ModelArtifact for LogisticPipeline {
    fn predict_proba(&self, row: &[FeatureValue]) -> Result<Vec<f64>, BackendError> {
        let p = self.positive_probability(row)?;
        Ok(vec![1.0 - p, p])
    }

    fn predict(&self, row: &[FeatureValue]) -> Result<i64, BackendError> {
        let p = self.positive_probability(row)?;
        Ok(if p >= self.threshold { 1 } else { 0 })
    }

    fn artifact_name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> Option<Vec<&str>> {
        Some(self.columns.iter().map(ColumnTransform::name).collect())
    }
}
