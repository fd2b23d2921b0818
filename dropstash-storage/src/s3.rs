//! S3-compatible object store backend.
//!
//! Works against AWS S3, Digital Ocean Spaces, and MinIO. Keys live under
//! an optional fixed namespace prefix which is stripped again on listing,
//! so callers see the same keys on every backend.

use crate::backend::{StorageBackend, StoredObject};
use crate::config::S3Config;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Object-store backend holding one configured client for its lifetime.
pub struct S3Backend {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Backend {
    /// Builds a client from static credentials, with an optional endpoint
    /// override for S3-compatible stores (forces path-style addressing).
    pub fn connect(config: &S3Config) -> Self {
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "dropstash-static",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(aws_types::region::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .behavior_version_latest();

        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            prefix: config.prefix.trim_matches('/').to_string(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.prefix)
        }
    }

    /// Inverse of [`full_key`](Self::full_key): restores the caller's view
    /// of a key returned by the store.
    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            return key;
        }
        key.strip_prefix(&self.prefix)
            .and_then(|k| k.strip_prefix('/'))
            .unwrap_or(key)
    }
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos()).unwrap_or_else(Utc::now)
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn save(&self, key: &str, data: &[u8], content_type: Option<&str>) -> StorageResult<()> {
        let full_key = self.full_key(key);
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed for {key}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{full_key}", self.bucket);
        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let full_key = self.full_key(key);

        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                return if service_err.is_no_such_key() {
                    Err(StorageError::NotFound(key.to_string()))
                } else {
                    Err(StorageError::S3(format!(
                        "download failed for {key}: {service_err}"
                    )))
                };
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("failed to read body for {key}: {e}")))?;

        let bytes = body.into_bytes().to_vec();
        debug!(
            "downloaded {} bytes from s3://{}/{full_key}",
            bytes.len(),
            self.bucket
        );
        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        // DeleteObject succeeds on missing keys, so check first to report
        // whether anything was actually removed.
        if !self.exists(key).await? {
            return Ok(false);
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed for {key}: {e}")))?;

        Ok(true)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::S3(format!(
                        "head object failed for {key}: {service_err}"
                    )))
                }
            }
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let search_prefix = if prefix.is_empty() {
            self.prefix.clone()
        } else {
            self.full_key(prefix)
        };

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(search_prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| StorageError::S3(format!("list failed for prefix {prefix}: {e}")))?;
            for obj in page.contents() {
                let Some(full_key) = obj.key() else {
                    continue;
                };
                objects.push(StoredObject {
                    key: self.strip_prefix(full_key).to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified().map(to_chrono).unwrap_or_else(Utc::now),
                    // ListObjectsV2 does not return content types
                    content_type: None,
                });
            }
        }

        Ok(objects)
    }

    async fn get_metadata(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(resp) => Ok(Some(StoredObject {
                key: key.to_string(),
                size: resp.content_length().unwrap_or(0).max(0) as u64,
                last_modified: resp.last_modified().map(to_chrono).unwrap_or_else(Utc::now),
                content_type: resp.content_type().map(str::to_string),
            })),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(None)
                } else {
                    Err(StorageError::S3(format!(
                        "head object failed for {key}: {service_err}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(prefix: &str) -> S3Backend {
        S3Backend::connect(&S3Config {
            bucket: "dropstash-test".into(),
            endpoint: Some("http://localhost:9000".into()),
            region: "us-east-1".into(),
            access_key: "test".into(),
            secret_key: "test".into(),
            prefix: prefix.into(),
        })
    }

    #[test]
    fn full_key_applies_namespace_prefix() {
        assert_eq!(backend("uploads").full_key("a.txt"), "uploads/a.txt");
        assert_eq!(backend("").full_key("a.txt"), "a.txt");
        // Surrounding slashes in the configured prefix are trimmed
        assert_eq!(backend("/uploads/").full_key("a.txt"), "uploads/a.txt");
    }

    #[test]
    fn strip_prefix_restores_caller_view() {
        let b = backend("uploads");
        assert_eq!(b.strip_prefix("uploads/a.txt"), "a.txt");
        assert_eq!(b.strip_prefix("other/a.txt"), "other/a.txt");
        assert_eq!(backend("").strip_prefix("a.txt"), "a.txt");
    }
}
