//! Schema-driven inference pipeline for the NAFLD lifestyle risk predictor.
//!
//! Named form values are validated against the feature schema and field
//! catalog, assembled into the ordered row the model was trained on, scored,
//! and classified into a risk band. Each result can be audited best-effort.

pub mod assemble;
pub mod audit;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod handler;
pub mod inference;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod schema;

pub use assemble::{validate_field, InputAssembler, NamedValues, PredictionRequest};
pub use audit::{
    backend_from_config, parse_audit_uri, AuditBackend, AuditError, AuditRecord, AuditSink,
    AuditTarget, JsonlFileBackend, AUDIT_SCHEMA_VERSION,
};
pub use catalog::{FieldCatalog, FieldSpec, NumericRange};
pub use classify::{classify, risk_band, risk_percentage, PredictionResult, RiskBand};
pub use config::{AuditConfig, ConfigError, PredictorConfig};
pub use error::{
    ErrorKind, ModelInvocationError, PredictError, SchemaError, StartupError, ValidationError,
};
pub use handler::{DisplayResponse, Outcome, PredictorContext, RequestHandler, RequestState};
pub use inference::{InferenceEngine, Score};
pub use nafld_model::{FeatureValue, ModelArtifact};
pub use schema::FeatureSchema;
