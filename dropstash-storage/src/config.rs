//! Backend selection and configuration.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Chooses the active backend at process start.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Local filesystem (development).
    Local { base_dir: PathBuf },
    /// S3-compatible object store (production).
    S3(S3Config),
}

/// Connection settings for an S3-compatible store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    /// Endpoint override for non-AWS stores (e.g. Spaces, MinIO).
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Namespace prefix prepended to every key (e.g. "uploads").
    #[serde(default)]
    pub prefix: String,
}

impl StorageConfig {
    /// Reads backend selection from the environment.
    ///
    /// `STORAGE_TYPE` chooses `local` (the default) or `s3`. Local mode
    /// reads `UPLOAD_FOLDER`; s3 mode reads `SPACES_BUCKET` (required),
    /// `SPACES_ENDPOINT`, `SPACES_REGION`, `SPACES_ACCESS_KEY`,
    /// `SPACES_SECRET_KEY`, and `SPACES_PREFIX`.
    pub fn from_env() -> StorageResult<Self> {
        let storage_type = env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".to_string());
        match storage_type.as_str() {
            "s3" => {
                let bucket = env::var("SPACES_BUCKET").map_err(|_| {
                    StorageError::Config("s3 storage requires SPACES_BUCKET".into())
                })?;
                Ok(Self::S3(S3Config {
                    bucket,
                    endpoint: env::var("SPACES_ENDPOINT").ok(),
                    region: env::var("SPACES_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                    access_key: env::var("SPACES_ACCESS_KEY").unwrap_or_default(),
                    secret_key: env::var("SPACES_SECRET_KEY").unwrap_or_default(),
                    prefix: env::var("SPACES_PREFIX").unwrap_or_default(),
                }))
            }
            "local" => Ok(Self::Local {
                base_dir: env::var("UPLOAD_FOLDER")
                    .unwrap_or_else(|_| "uploads".to_string())
                    .into(),
            }),
            other => Err(StorageError::Config(format!(
                "unknown storage type: {other}"
            ))),
        }
    }
}
