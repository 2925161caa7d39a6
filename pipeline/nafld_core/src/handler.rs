//! Request orchestration: validate, score, classify, then audit.
//!
//! Each call runs `Validating -> Scoring -> Classifying -> Auditing -> Done`
//! in one pass. A validation or scoring failure ends the call in
//! `Failed(kind)` without classifying or auditing. Auditing is queued after
//! the result exists and cannot change the terminal state.

use crate::assemble::{InputAssembler, NamedValues};
use crate::audit::{AuditRecord, AuditSink};
use crate::catalog::FieldCatalog;
use crate::classify::{classify, PredictionResult};
use crate::config::PredictorConfig;
use crate::error::{ErrorKind, PredictError, StartupError};
use crate::inference::InferenceEngine;
use crate::schema::FeatureSchema;
use nafld_model::LogisticPipeline;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Immutable state shared by every request: schema, field catalog, model
#[derive(Debug)]
pub struct PredictorContext {
    schema: FeatureSchema,
    catalog: FieldCatalog,
    engine: InferenceEngine,
}

impl PredictorContext {
    pub fn new(schema: FeatureSchema, catalog: FieldCatalog, engine: InferenceEngine) -> Self {
        if let Some(columns) = engine.artifact().feature_names() {
            if !columns.iter().copied().eq(schema.iter()) {
                log::warn!(
                    "model artifact '{}' columns differ from the feature schema; vectors follow schema order",
                    engine.artifact().artifact_name()
                );
            }
        }
        for name in schema.iter().filter(|n| !catalog.is_declared(n)) {
            log::info!("feature '{name}' has no preset; accepting any number");
        }
        Self {
            schema,
            catalog,
            engine,
        }
    }

    /// Load schema and model artifact named by `cfg`; either failing is fatal
    pub fn initialize(cfg: &PredictorConfig) -> Result<Self, StartupError> {
        let schema = FeatureSchema::load(&cfg.features_path)?;
        let model =
            LogisticPipeline::load(&cfg.model_path).map_err(|source| StartupError::Model {
                path: cfg.model_path.clone(),
                source,
            })?;
        let engine = InferenceEngine::new(Arc::new(model));
        Ok(Self::new(schema, FieldCatalog::builtin(), engine))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn assembler(&self) -> InputAssembler<'_> {
        InputAssembler::new(&self.schema, &self.catalog)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Validating,
    Scoring,
    Classifying,
    Auditing,
    Done,
    Failed(ErrorKind),
}

/// Terminal state of one call together with its result
#[derive(Debug)]
pub struct Outcome {
    pub state: RequestState,
    pub result: Result<PredictionResult, PredictError>,
}

/// What the presentation layer shows: a message, and the probability unless
/// the request failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayResponse {
    pub message: String,
    pub probability: Option<f64>,
}

impl From<&Result<PredictionResult, PredictError>> for DisplayResponse {
    fn from(result: &Result<PredictionResult, PredictError>) -> Self {
        match result {
            Ok(r) => DisplayResponse {
                message: r.display_message(),
                probability: Some(r.probability),
            },
            Err(e) => DisplayResponse {
                message: e.to_string(),
                probability: None,
            },
        }
    }
}

fn advance(state: &mut RequestState, next: RequestState) {
    log::debug!("prediction request: {state:?} -> {next:?}");
    *state = next;
}

fn fail(state: RequestState, err: PredictError) -> Outcome {
    let failed = RequestState::Failed(err.kind());
    log::debug!("prediction request: {state:?} -> {failed:?}: {err}");
    Outcome {
        state: failed,
        result: Err(err),
    }
}

/// Serves prediction calls against a shared [`PredictorContext`]
#[derive(Debug)]
pub struct RequestHandler {
    context: Arc<PredictorContext>,
    audit: AuditSink,
}

impl RequestHandler {
    pub fn new(context: Arc<PredictorContext>, audit: AuditSink) -> Self {
        Self { context, audit }
    }

    /// Initialize context and audit sink from configuration
    pub fn from_config(cfg: &PredictorConfig) -> Result<Self, StartupError> {
        let context = PredictorContext::initialize(cfg)?;
        Ok(Self::new(Arc::new(context), AuditSink::from_config(&cfg.audit)))
    }

    pub fn context(&self) -> &PredictorContext {
        &self.context
    }

    pub fn audit(&self) -> &AuditSink {
        &self.audit
    }

    pub fn execute(&self, named: &NamedValues) -> Outcome {
        let mut state = RequestState::Validating;
        let request = match self.context.assembler().assemble(named) {
            Ok(request) => request,
            Err(e) => return fail(state, e.into()),
        };

        advance(&mut state, RequestState::Scoring);
        let score = match self.context.engine.score(&request) {
            Ok(score) => score,
            Err(e) => return fail(state, e.into()),
        };

        advance(&mut state, RequestState::Classifying);
        let result = classify(score.probability, score.label);

        advance(&mut state, RequestState::Auditing);
        if self.audit.is_enabled() {
            let inputs = request.to_named(&self.context.schema);
            self.audit.record(AuditRecord::new(inputs, &result));
        }

        advance(&mut state, RequestState::Done);
        Outcome {
            state,
            result: Ok(result),
        }
    }

    pub fn predict(&self, named: &NamedValues) -> Result<PredictionResult, PredictError> {
        self.execute(named).result
    }

    /// Values given by schema position rather than by name
    pub fn predict_positional(
        &self,
        values: &[JsonValue],
    ) -> Result<PredictionResult, PredictError> {
        let named = self.context.assembler().name_positional(values)?;
        self.predict(&named)
    }

    pub fn handle(&self, named: &NamedValues) -> DisplayResponse {
        DisplayResponse::from(&self.predict(named))
    }

    pub fn handle_positional(&self, values: &[JsonValue]) -> DisplayResponse {
        DisplayResponse::from(&self.predict_positional(values))
    }

    /// Wait for queued audit records, then release the handler
    pub fn shutdown(self) {
        self.audit.shutdown();
    }
}
