//! Best-effort persistence of prediction records.
//!
//! [`AuditSink::record`] hands the record to a background worker and returns
//! immediately. Backend failures (and backend panics) are logged on the worker
//! and never reach the request path. The queue is bounded and closing the
//! sink waits only up to a timeout, so a stuck store cannot hold the process.
//! With no backend configured the sink is a no-op.

use crate::assemble::NamedValues;
use crate::classify::{PredictionResult, RiskBand};
use crate::config::AuditConfig;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, TrySendError};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Version tag stamped on every record
pub const AUDIT_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("unsupported audit backend '{0}'")]
    Unsupported(String),
    #[error("audit store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("audit backend error: {0}")]
    Backend(String),
}

/// Snapshot of one request and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub ts: DateTime<Utc>,
    pub inputs: NamedValues,
    pub probability: f64,
    pub label: u8,
    pub risk_pct: f64,
    pub risk_band: RiskBand,
    pub app_version: String,
}

impl AuditRecord {
    pub fn new(inputs: NamedValues, result: &PredictionResult) -> Self {
        Self {
            ts: Utc::now(),
            inputs,
            probability: result.probability,
            label: result.label,
            risk_pct: result.risk_percentage,
            risk_band: result.risk_band,
            app_version: AUDIT_SCHEMA_VERSION.to_string(),
        }
    }
}

/// Record-oriented store that audit records are appended to
pub trait AuditBackend: Send + Sync {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError>;

    fn backend_name(&self) -> &str;
}

/// Appends one JSON document per line to `<dir>/<database>/<collection>.jsonl`
#[derive(Debug)]
pub struct JsonlFileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlFileBackend {
    pub fn open(
        dir: impl AsRef<Path>,
        database: &str,
        collection: &str,
    ) -> Result<Self, AuditError> {
        let db_dir = dir.as_ref().join(sanitize(database));
        create_dir_all(&db_dir).map_err(|source| AuditError::Io {
            path: db_dir.clone(),
            source,
        })?;
        Ok(Self {
            path: db_dir.join(format!("{}.jsonl", sanitize(collection))),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

impl AuditBackend for JsonlFileBackend {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let io_err = |source| AuditError::Io {
            path: self.path.clone(),
            source,
        };
        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(&line).map_err(io_err)
    }

    fn backend_name(&self) -> &str {
        "jsonl"
    }
}

/// Store selected by an audit URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    /// JSON-lines files under this directory
    Directory(PathBuf),
    /// MongoDB deployment; the full connection string
    MongoDb(String),
}

/// Interpret an audit URI. `Ok(None)` means auditing is off.
///
/// Accepted forms: `file:///<dir>`, `file://localhost/<dir>`, a bare
/// directory path, `mongodb://...` and `mongodb+srv://...`.
pub fn parse_audit_uri(uri: Option<&str>) -> Result<Option<AuditTarget>, AuditError> {
    let uri = match uri.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(uri) => uri,
    };
    match uri.split_once("://") {
        Some(("file", rest)) => file_uri_path(rest)
            .map(|dir| Some(AuditTarget::Directory(dir)))
            .ok_or_else(|| AuditError::Unsupported(uri.to_string())),
        Some(("mongodb" | "mongodb+srv", _)) => Ok(Some(AuditTarget::MongoDb(uri.to_string()))),
        Some((scheme, _)) => Err(AuditError::Unsupported(scheme.to_string())),
        None => Ok(Some(AuditTarget::Directory(PathBuf::from(uri)))),
    }
}

/// Path part of a `file://` URI; only an empty or `localhost` host is local
fn file_uri_path(rest: &str) -> Option<PathBuf> {
    if rest.starts_with('/') {
        return Some(PathBuf::from(rest));
    }
    match rest.split_once('/') {
        Some(("localhost", path)) => Some(Path::new("/").join(path)),
        _ => None,
    }
}

/// Build the backend named by `cfg.uri`. `Ok(None)` means auditing is off.
pub fn backend_from_config(cfg: &AuditConfig) -> Result<Option<Box<dyn AuditBackend>>, AuditError> {
    let backend: Box<dyn AuditBackend> = match parse_audit_uri(cfg.uri.as_deref())? {
        None => return Ok(None),
        Some(AuditTarget::Directory(dir)) => {
            Box::new(JsonlFileBackend::open(dir, &cfg.database, &cfg.collection)?)
        }
        #[cfg(feature = "mongodb")]
        Some(AuditTarget::MongoDb(uri)) => Box::new(crate::mongo::MongoBackend::connect(
            &uri,
            &cfg.database,
            &cfg.collection,
        )?),
        #[cfg(not(feature = "mongodb"))]
        Some(AuditTarget::MongoDb(_)) => {
            return Err(AuditError::Unsupported(
                "mongodb (built without the `mongodb` feature)".to_string(),
            ))
        }
    };
    Ok(Some(backend))
}

struct Worker {
    tx: Option<mpsc::SyncSender<AuditRecord>>,
    /// Disconnects when the worker thread exits
    finished: mpsc::Receiver<()>,
    handle: Option<JoinHandle<()>>,
    backend_name: String,
    queue_capacity: usize,
    shutdown_timeout: Duration,
}

/// Fire-and-forget front of an optional [`AuditBackend`].
///
/// At most `queue_capacity` records wait for the backend; further records are
/// dropped with a warning. Closing waits up to `shutdown_timeout` for the
/// backlog and then detaches the worker.
pub struct AuditSink {
    worker: Option<Worker>,
}

impl std::fmt::Debug for AuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSink")
            .field("backend", &self.backend_name())
            .finish()
    }
}

impl Default for AuditSink {
    fn default() -> Self {
        Self::disabled()
    }
}

impl AuditSink {
    pub fn disabled() -> Self {
        Self { worker: None }
    }

    /// Never fails: an unusable backend degrades to disabled auditing
    pub fn from_config(cfg: &AuditConfig) -> Self {
        match backend_from_config(cfg) {
            Ok(Some(backend)) => {
                Self::with_limits(backend, cfg.queue_capacity, cfg.shutdown_timeout())
            }
            Ok(None) => {
                log::debug!("audit logging disabled: no backend configured");
                Self::disabled()
            }
            Err(e) => {
                log::warn!("audit logging disabled: {e}");
                Self::disabled()
            }
        }
    }

    /// Default queue capacity and shutdown timeout
    pub fn with_backend(backend: Box<dyn AuditBackend>) -> Self {
        let defaults = AuditConfig::default();
        Self::with_limits(backend, defaults.queue_capacity, defaults.shutdown_timeout())
    }

    pub fn with_limits(
        backend: Box<dyn AuditBackend>,
        queue_capacity: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        let backend_name = backend.backend_name().to_string();
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = mpsc::sync_channel::<AuditRecord>(queue_capacity);
        let (finished_tx, finished) = mpsc::channel::<()>();
        let spawned = std::thread::Builder::new()
            .name("nafld-audit".into())
            .spawn(move || {
                let _finished = finished_tx;
                drain(backend, rx);
            });
        match spawned {
            Ok(handle) => {
                log::info!("audit logging enabled ({backend_name})");
                Self {
                    worker: Some(Worker {
                        tx: Some(tx),
                        finished,
                        handle: Some(handle),
                        backend_name,
                        queue_capacity,
                        shutdown_timeout,
                    }),
                }
            }
            Err(e) => {
                log::warn!("audit logging disabled: failed to start worker: {e}");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.worker.is_some()
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.worker.as_ref().map(|w| w.backend_name.as_str())
    }

    /// Queue a record for writing; never waits on the backend
    pub fn record(&self, record: AuditRecord) {
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        let Some(tx) = worker.tx.as_ref() else {
            return;
        };
        match tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::warn!(
                "audit record dropped: {} records already pending for {}",
                worker.queue_capacity,
                worker.backend_name
            ),
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("audit record dropped: worker has stopped")
            }
        }
    }

    /// Stop accepting records and give queued ones until the shutdown
    /// timeout to be written
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        drop(worker.tx.take());
        match worker.finished.recv_timeout(worker.shutdown_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                // dropping the handle detaches the thread
                log::warn!(
                    "audit backend {} still busy after {:?}; pending records abandoned",
                    worker.backend_name,
                    worker.shutdown_timeout
                );
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = worker.handle.take() {
                    if handle.join().is_err() {
                        log::warn!("audit worker terminated abnormally");
                    }
                }
            }
        }
    }
}

impl Drop for AuditSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn drain(backend: Box<dyn AuditBackend>, rx: mpsc::Receiver<AuditRecord>) {
    for record in rx {
        match catch_unwind(AssertUnwindSafe(|| backend.write(&record))) {
            Ok(Ok(())) => log::trace!("audit record written to {}", backend.backend_name()),
            Ok(Err(e)) => log::warn!("audit log failed: {e}"),
            Err(_) => log::warn!("audit log failed: backend panicked"),
        }
    }
}
