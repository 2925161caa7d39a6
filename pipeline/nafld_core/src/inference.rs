//! Single-call scoring against the loaded model artifact.

use crate::assemble::PredictionRequest;
use crate::error::ModelInvocationError;
use nafld_model::ModelArtifact;
use std::sync::Arc;

const POSITIVE_CLASS: usize = 1;
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Raw model output for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub probability: f64,
    pub label: u8,
}

/// Wraps a read-only artifact shared by every request
#[derive(Clone)]
pub struct InferenceEngine {
    artifact: Arc<dyn ModelArtifact>,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("artifact", &self.artifact.artifact_name())
            .finish()
    }
}

impl InferenceEngine {
    pub fn new(artifact: Arc<dyn ModelArtifact>) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &dyn ModelArtifact {
        self.artifact.as_ref()
    }

    /// Positive-class probability and class label. One artifact call each,
    /// no retries.
    pub fn score(&self, request: &PredictionRequest) -> Result<Score, ModelInvocationError> {
        let row = request.values();
        let proba = self.artifact.predict_proba(row)?;
        if proba.len() != 2 {
            return Err(ModelInvocationError::OutputShape(proba.len()));
        }
        if proba.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p)) {
            return Err(ModelInvocationError::ProbabilityOutOfRange(proba));
        }
        let sum = proba[0] + proba[1];
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ModelInvocationError::ProbabilitySum(sum));
        }
        let label = match self.artifact.predict(row)? {
            0 => 0,
            1 => 1,
            other => return Err(ModelInvocationError::UnexpectedLabel(other)),
        };
        Ok(Score {
            probability: proba[POSITIVE_CLASS],
            label,
        })
    }
}
