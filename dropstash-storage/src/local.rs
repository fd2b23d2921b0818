//! Local filesystem backend.

use crate::backend::{StorageBackend, StoredObject};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Filesystem-backed storage rooted at one base directory.
///
/// Keys map to paths below the base; listing covers one level below it.
/// Two writers targeting the same key are not serialized here — the
/// application layer writes each key from a single place.
pub struct LocalBackend {
    base_dir: PathBuf,
}

impl LocalBackend {
    /// Opens the backend, creating the base directory if absent.
    pub async fn open(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

/// Creation time as the age reference, with mtime as the fallback on
/// filesystems that do not record it.
fn creation_time(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.created()
        .or_else(|_| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn descriptor(key: &str, meta: &std::fs::Metadata) -> StoredObject {
    StoredObject {
        key: key.to_string(),
        size: meta.len(),
        last_modified: creation_time(meta),
        content_type: None,
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn save(
        &self,
        key: &str,
        data: &[u8],
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        let path = self.full_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Stage to a hidden sibling and rename so a concurrent read never
        // observes a half-written object. The staged name starts with a
        // dot and carries a timestamp, so it cannot collide with a caller
        // key and listings never report it as an object.
        let basename = key.rsplit('/').next().unwrap_or(key);
        let staging = path.with_file_name(format!(
            ".{basename}.{}.partial",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::write(&staging, data).await?;
        fs::rename(&staging, &path).await?;

        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        match fs::read(self.full_path(key)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        match fs::remove_file(self.full_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(fs::try_exists(self.full_path(key)).await?)
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        // Prefixes with directory components filter by their basename,
        // matching the flat-namespace view the S3 backend presents.
        let name_prefix = prefix.rsplit('/').next().unwrap_or(prefix);

        let mut objects = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(name_prefix) {
                continue;
            }
            // In-flight staging files are not objects
            if name.starts_with('.') && name.ends_with(".partial") {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            objects.push(descriptor(name, &meta));
        }

        Ok(objects)
    }

    async fn get_metadata(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        match fs::metadata(self.full_path(key)).await {
            Ok(meta) if meta.is_file() => Ok(Some(descriptor(key, &meta))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
