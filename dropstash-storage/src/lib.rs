//! Storage abstraction layer for dropstash.
//!
//! One polymorphic contract ([`StorageBackend`]) with two conforming
//! implementations:
//! - [`LocalBackend`]: local filesystem (development)
//! - [`S3Backend`]: S3-compatible object store such as Digital Ocean
//!   Spaces or MinIO (production)
//!
//! The active backend is chosen once at process start from
//! [`StorageConfig`] and held as a single immutable [`Storage`] handle.
//! Backends are stateless beyond their configuration, so the handle is
//! shared across request handlers and the retention sweeper without
//! locking.

mod backend;
mod config;
mod error;
mod local;
mod s3;

pub use backend::{StorageBackend, StoredObject};
pub use config::{S3Config, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use local::LocalBackend;
pub use s3::S3Backend;

use async_trait::async_trait;
use tracing::info;

/// The process-wide backend handle, selected once at startup.
///
/// A tagged enum rather than a boxed trait object so the choice is
/// visible in the type and calls dispatch statically.
pub enum Storage {
    Local(LocalBackend),
    S3(S3Backend),
}

impl Storage {
    /// Builds the backend named by `config`.
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        match config {
            StorageConfig::Local { base_dir } => {
                let backend = LocalBackend::open(base_dir.clone()).await?;
                info!("initialized local storage at {}", base_dir.display());
                Ok(Self::Local(backend))
            }
            StorageConfig::S3(s3) => {
                let backend = S3Backend::connect(s3);
                info!("initialized s3 storage for bucket {}", s3.bucket);
                Ok(Self::S3(backend))
            }
        }
    }
}

#[async_trait]
impl StorageBackend for Storage {
    async fn save(&self, key: &str, data: &[u8], content_type: Option<&str>) -> StorageResult<()> {
        match self {
            Self::Local(b) => b.save(key, data, content_type).await,
            Self::S3(b) => b.save(key, data, content_type).await,
        }
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        match self {
            Self::Local(b) => b.read(key).await,
            Self::S3(b) => b.read(key).await,
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        match self {
            Self::Local(b) => b.delete(key).await,
            Self::S3(b) => b.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self {
            Self::Local(b) => b.exists(key).await,
            Self::S3(b) => b.exists(key).await,
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        match self {
            Self::Local(b) => b.list(prefix).await,
            Self::S3(b) => b.list(prefix).await,
        }
    }

    async fn get_metadata(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        match self {
            Self::Local(b) => b.get_metadata(key).await,
            Self::S3(b) => b.get_metadata(key).await,
        }
    }
}
