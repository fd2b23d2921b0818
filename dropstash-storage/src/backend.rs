//! The polymorphic storage contract.

use crate::error::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Metadata record for one stored object, produced by listing and
/// metadata calls. Never mutated in place: a new write replaces the
/// object and its descriptor wholesale.
#[derive(Clone, Debug, Serialize)]
pub struct StoredObject {
    /// Logical key, unique within the backend namespace.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation-time proxy used for age-based retention.
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Basename of the key.
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Abstract contract every storage backend satisfies.
///
/// Backends own their connection/config for their lifetime and carry no
/// other state, so one instance serves concurrent callers without
/// synchronization. The six primitives are backend-specific;
/// [`delete_older_than`](StorageBackend::delete_older_than) is
/// implemented once on top of `list` and `delete`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stores `data` under `key`, replacing any existing object. A
    /// concurrent `read` observes either the old object or the new one,
    /// never a mix.
    async fn save(&self, key: &str, data: &[u8], content_type: Option<&str>)
        -> StorageResult<()>;

    /// Reads the full object, failing with `StorageError::NotFound`
    /// when the key does not exist.
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Deletes an object, returning whether something was removed.
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Lists all objects whose key starts with `prefix`, in no
    /// particular order. Implementations paginate internally; the result
    /// is complete from the caller's perspective.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>>;

    async fn get_metadata(&self, key: &str) -> StorageResult<Option<StoredObject>>;

    /// Deletes every object under `prefix` older than `max_age`,
    /// returning the keys actually removed.
    ///
    /// Individual delete failures are logged and skipped so one bad
    /// object cannot stall the rest of the sweep.
    async fn delete_older_than(
        &self,
        prefix: &str,
        max_age: Duration,
    ) -> StorageResult<Vec<String>> {
        let now = Utc::now();
        let mut deleted = Vec::new();

        for object in self.list(prefix).await? {
            let age = now.signed_duration_since(object.last_modified);
            if age <= max_age {
                continue;
            }
            match self.delete(&object.key).await {
                Ok(true) => {
                    info!("deleted expired object: {}", object.key);
                    deleted.push(object.key);
                }
                Ok(false) => {}
                Err(e) => warn!("failed to delete expired object {}: {e}", object.key),
            }
        }

        Ok(deleted)
    }
}
