//! MongoDB audit store, one document per prediction.

use crate::audit::{AuditBackend, AuditError, AuditRecord};
use mongodb::sync::{Client, Collection};

/// Inserts records into `<database>.<collection>` through the blocking client
pub struct MongoBackend {
    collection: Collection<AuditRecord>,
    namespace: String,
}

impl MongoBackend {
    /// Client construction does not contact the server; an unreachable
    /// deployment surfaces as failed writes on the audit worker
    pub fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AuditError> {
        let client = Client::with_uri_str(uri)
            .map_err(|e| AuditError::Backend(format!("mongodb client: {e}")))?;
        let namespace = format!("{database}.{collection}");
        log::debug!("audit records go to mongodb namespace {namespace}");
        Ok(Self {
            collection: client.database(database).collection(collection),
            namespace,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl AuditBackend for MongoBackend {
    fn write(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.collection
            .insert_one(record)
            .run()
            .map(|_| ())
            .map_err(|e| AuditError::Backend(format!("insert into {}: {e}", self.namespace)))
    }

    fn backend_name(&self) -> &str {
        "mongodb"
    }
}
