//! Shared fixtures for the workspace integration tests: stub model
//! artifacts, stub audit backends and a small two-field context.

use nafld_core::{
    AuditBackend, AuditError, AuditRecord, AuditSink, FeatureSchema, FieldCatalog, FieldSpec,
    InferenceEngine, NumericRange, PredictorContext, RequestHandler,
};
use nafld_model::{BackendError, FeatureValue, ModelArtifact};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Returns a fixed positive-class probability and counts invocations
pub struct StubModel {
    probability: f64,
    calls: Arc<AtomicUsize>,
    rows: Mutex<Vec<Vec<FeatureValue>>>,
}

impl StubModel {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            calls: Arc::new(AtomicUsize::new(0)),
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Rows received so far, in call order
    pub fn rows(&self) -> Vec<Vec<FeatureValue>> {
        self.rows.lock().clone()
    }
}

impl ModelArtifact for StubModel {
    fn predict_proba(&self, row: &[FeatureValue]) -> Result<Vec<f64>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().push(row.to_vec());
        Ok(vec![1.0 - self.probability, self.probability])
    }

    fn predict(&self, _row: &[FeatureValue]) -> Result<i64, BackendError> {
        Ok(i64::from(self.probability >= 0.5))
    }

    fn artifact_name(&self) -> &str {
        "stub"
    }
}

/// Every call fails inside the model
pub struct BrokenModel;

impl ModelArtifact for BrokenModel {
    fn predict_proba(&self, _row: &[FeatureValue]) -> Result<Vec<f64>, BackendError> {
        Err(BackendError::InferenceError("matrix is singular".into()))
    }

    fn predict(&self, _row: &[FeatureValue]) -> Result<i64, BackendError> {
        Err(BackendError::InferenceError("matrix is singular".into()))
    }

    fn artifact_name(&self) -> &str {
        "broken"
    }
}

pub fn two_field_schema() -> FeatureSchema {
    FeatureSchema::from_names(["Gender", "Age in years"]).expect("non-empty schema")
}

pub fn two_field_catalog() -> FieldCatalog {
    FieldCatalog::new()
        .with("Gender", FieldSpec::categorical(["Male", "Female"]))
        .with(
            "Age in years",
            FieldSpec::BoundedNumeric(NumericRange::new(18.0, 85.0, 40.0, 1.0)),
        )
}

pub fn context_with(model: Arc<dyn ModelArtifact>) -> Arc<PredictorContext> {
    Arc::new(PredictorContext::new(
        two_field_schema(),
        two_field_catalog(),
        InferenceEngine::new(model),
    ))
}

pub fn handler_with(model: Arc<dyn ModelArtifact>, audit: AuditSink) -> RequestHandler {
    let _ = env_logger::builder().is_test(true).try_init();
    RequestHandler::new(context_with(model), audit)
}

/// Collects written records for later inspection
#[derive(Default)]
pub struct CollectingBackend {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl CollectingBackend {
    pub fn records(&self) -> Arc<Mutex<Vec<AuditRecord>>> {
        self.records.clone()
    }
}

impl AuditBackend for CollectingBackend {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "collecting"
    }
}

/// Store that is always unreachable
pub struct UnreachableBackend;

impl AuditBackend for UnreachableBackend {
    fn write(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::Backend("connection refused".into()))
    }

    fn backend_name(&self) -> &str {
        "unreachable"
    }
}

/// Holds every write until the test releases it, then reports completion
pub struct GatedBackend {
    gate: Mutex<Receiver<()>>,
    done: Mutex<Sender<()>>,
}

impl GatedBackend {
    /// Returns the backend, the release sender and the completion receiver
    pub fn new() -> (Self, Sender<()>, Receiver<()>) {
        let (release_tx, release_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        (
            Self {
                gate: Mutex::new(release_rx),
                done: Mutex::new(done_tx),
            },
            release_tx,
            done_rx,
        )
    }
}

impl AuditBackend for GatedBackend {
    fn write(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        self.gate
            .lock()
            .recv()
            .map_err(|_| AuditError::Backend("gate closed".into()))?;
        let _ = self.done.lock().send(());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "gated"
    }
}

/// Takes a fixed time for every write, like a store on a hung mount
pub struct SlowBackend {
    delay: Duration,
}

impl SlowBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl AuditBackend for SlowBackend {
    fn write(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        std::thread::sleep(self.delay);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "slow"
    }
}
