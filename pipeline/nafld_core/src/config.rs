//! Startup configuration: optional TOML file overlaid by environment variables.
//!
//! ```toml
//! model_path = "pipeline.json"
//! features_path = "feature_order.json"
//!
//! [audit]
//! uri = "file:///var/lib/nafld/audit"
//! database = "nafld"
//! collection = "predictions"
//! queue_capacity = 256
//! shutdown_timeout_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_MODEL_PATH: &str = "NAFLD_MODEL_PATH";
pub const ENV_FEATURES_PATH: &str = "NAFLD_FEATURES_PATH";
pub const ENV_AUDIT_URI: &str = "NAFLD_AUDIT_URI";
pub const ENV_AUDIT_DB: &str = "NAFLD_AUDIT_DB";
pub const ENV_AUDIT_COLLECTION: &str = "NAFLD_AUDIT_COLLECTION";

/// Variable names used by earlier MongoDB-only deployments; consulted only
/// when the matching `NAFLD_*` variable is unset or empty
pub const LEGACY_ENV_AUDIT_URI: &str = "MONGODB_URI";
pub const LEGACY_ENV_AUDIT_DB: &str = "MONGODB_DB";
pub const LEGACY_ENV_AUDIT_COLLECTION: &str = "MONGODB_COLLECT";

const DEFAULT_QUEUE_CAPACITY: usize = 256;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where audit records go; no `uri` means auditing is disabled.
///
/// Records beyond `queue_capacity` pending writes are dropped, and shutdown
/// waits at most `shutdown_timeout_ms` for the backlog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
    pub queue_capacity: usize,
    pub shutdown_timeout_ms: u64,
}

impl AuditConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: "nafld".to_string(),
            collection: "predictions".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub model_path: PathBuf,
    pub features_path: PathBuf,
    pub audit: AuditConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("pipeline.json"),
            features_path: PathBuf::from("feature_order.json"),
            audit: AuditConfig::default(),
        }
    }
}

impl PredictorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read a config file. Relative artifact paths are taken relative to
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            cfg.model_path = rebase(base, &cfg.model_path);
            cfg.features_path = rebase(base, &cfg.features_path);
        }
        Ok(cfg)
    }

    /// File (when given) or defaults, then process environment on top
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let cfg = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        Ok(cfg.with_env_lookup(|key| std::env::var(key).ok()))
    }

    /// Overlay values from an environment-style lookup. Empty values are ignored.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_FEATURES_PATH) {
            self.features_path = PathBuf::from(v);
        }
        let get_or_legacy = |key: &str, legacy: &str| get(key).or_else(|| get(legacy));
        if let Some(v) = get_or_legacy(ENV_AUDIT_URI, LEGACY_ENV_AUDIT_URI) {
            self.audit.uri = Some(v);
        }
        if let Some(v) = get_or_legacy(ENV_AUDIT_DB, LEGACY_ENV_AUDIT_DB) {
            self.audit.database = v;
        }
        if let Some(v) = get_or_legacy(ENV_AUDIT_COLLECTION, LEGACY_ENV_AUDIT_COLLECTION) {
            self.audit.collection = v;
        }
        self
    }
}

fn rebase(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() || base.as_os_str().is_empty() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
