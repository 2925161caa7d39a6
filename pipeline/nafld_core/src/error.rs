//! Error taxonomy for startup and per-request failures.
//!
//! Startup errors abort initialization. Request errors are caught by the
//! request handler and turned into a rejected response; their kind stays
//! visible through [`PredictError::kind`].

use nafld_model::BackendError;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures building the feature schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to load feature schema from {source_name}: {reason}")]
    Load { source_name: String, reason: String },
    #[error("feature schema is empty")]
    Empty,
}

/// Input rejected against the feature schema or a field's domain
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing value for '{0}'")]
    MissingField(String),
    #[error("'{value}' is not a valid choice for '{field}' (expected one of: {})", .allowed.join(", "))]
    InvalidCategory {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("{value} is outside [{minimum}, {maximum}] for '{field}'")]
    OutOfRange {
        field: String,
        value: f64,
        minimum: f64,
        maximum: f64,
    },
    #[error("'{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("expected {expected} positional values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
}

impl ValidationError {
    /// Name of the offending field, when the error is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField(field)
            | ValidationError::InvalidCategory { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TypeMismatch { field, .. } => Some(field),
            ValidationError::ArityMismatch { .. } => None,
        }
    }
}

/// The model artifact failed or produced output outside its contract
#[derive(Debug, Error)]
pub enum ModelInvocationError {
    #[error("model artifact failed: {0}")]
    Artifact(#[from] BackendError),
    #[error("expected a two-class probability pair, got {0} values")]
    OutputShape(usize),
    #[error("class probabilities must be finite and within [0, 1], got {0:?}")]
    ProbabilityOutOfRange(Vec<f64>),
    #[error("class probabilities sum to {0}, expected 1")]
    ProbabilitySum(f64),
    #[error("expected class label 0 or 1, got {0}")]
    UnexpectedLabel(i64),
}

/// Stable classification of request failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingField,
    InvalidCategory,
    OutOfRange,
    TypeMismatch,
    ArityMismatch,
    ModelInvocation,
}

/// Any failure that terminates a single prediction request
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Inference error: {0}")]
    ModelInvocation(#[from] ModelInvocationError),
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::Validation(ValidationError::MissingField(_)) => ErrorKind::MissingField,
            PredictError::Validation(ValidationError::InvalidCategory { .. }) => {
                ErrorKind::InvalidCategory
            }
            PredictError::Validation(ValidationError::OutOfRange { .. }) => ErrorKind::OutOfRange,
            PredictError::Validation(ValidationError::TypeMismatch { .. }) => {
                ErrorKind::TypeMismatch
            }
            PredictError::Validation(ValidationError::ArityMismatch { .. }) => {
                ErrorKind::ArityMismatch
            }
            PredictError::ModelInvocation(_) => ErrorKind::ModelInvocation,
        }
    }
}

/// Failures that prevent the predictor from serving requests
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("model artifact {path} could not be loaded: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}
