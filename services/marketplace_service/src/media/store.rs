use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use service_core::s3::delete_object::{DeleteObject, DeleteObjectInput};
use service_core::s3::presign_get_object::{PresignGetObject, PresignGetObjectInput};
use service_core::s3::put_object::{PutObject, PutObjectInput};
use service_core::s3::ObjectStoreError;
use thiserror::Error;
use uuid::Uuid;

use super::reference::{object_url, AssetLocation, ReferenceError, LOCAL_PREFIX};
use super::upload::{StagedFile, UploadError};
use crate::context::ObjectStorageSettings;

/// Lifetime of every signed URL handed out.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Directory under the upload directory where incoming files are staged.
pub const STAGING_DIR: &str = ".staging";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    S3,
    Local,
}

/// A URL the caller can fetch the asset from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub url: String,
    pub media_type: MediaType,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("Object storage is not configured, cannot resolve {0}")]
    NotConfigured(String),

    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores an upload made for the course or user `owner_id` and returns the reference to record.
    async fn store(&self, owner_id: &Uuid, staged: StagedFile) -> Result<String, MediaStoreError>;

    async fn resolve(&self, reference: &str) -> Result<ResolvedMedia, MediaStoreError>;

    async fn remove(&self, reference: &str) -> Result<(), MediaStoreError>;

    /// Directory uploads are streamed into before `store` is called.
    fn staging_dir(&self) -> &Path;
}

/// Upload directory layout shared by both stores.
#[derive(Debug, Clone)]
struct LocalFiles {
    upload_dir: PathBuf,
    staging_dir: PathBuf,
    public_base_url: String,
}

impl LocalFiles {
    fn new(upload_dir: &Path, public_base_url: &str) -> Self {
        LocalFiles {
            upload_dir: upload_dir.to_path_buf(),
            staging_dir: upload_dir.join(STAGING_DIR),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &str) -> ResolvedMedia {
        ResolvedMedia {
            url: format!("{}{}", self.public_base_url, path),
            media_type: MediaType::Local,
            expires_in: None,
        }
    }

    async fn remove(&self, path: &str) -> Result<(), MediaStoreError> {
        let file_name = path.trim_start_matches(LOCAL_PREFIX).rsplit(&['/', '\\'][..]).next().unwrap_or_default();
        if file_name.is_empty() || file_name == ".." {
            return Ok(());
        }

        match tokio::fs::remove_file(self.upload_dir.join(file_name)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

pub struct S3MediaStore<T> {
    client: T,
    storage: ObjectStorageSettings,
    local: LocalFiles,
}

impl<T> S3MediaStore<T>
where
    T: PutObject + PresignGetObject + DeleteObject + Send + Sync,
{
    pub fn new(client: T, storage: ObjectStorageSettings, upload_dir: &Path, public_base_url: &str) -> Self {
        S3MediaStore {
            client,
            storage,
            local: LocalFiles::new(upload_dir, public_base_url),
        }
    }
}

#[async_trait]
impl<T> MediaStore for S3MediaStore<T>
where
    T: PutObject + PresignGetObject + DeleteObject + Send + Sync,
{
    #[tracing::instrument(skip(self, staged), fields(file_name = %staged.file_name(), size = staged.size()))]
    async fn store(&self, owner_id: &Uuid, staged: StagedFile) -> Result<String, MediaStoreError> {
        let kind = staged.kind();
        let key = kind.object_key(owner_id, staged.file_name(), Utc::now().timestamp_millis());
        let metadata = HashMap::from([
            (kind.owner_metadata_key().to_string(), owner_id.to_string()),
            ("upload-date".to_string(), Utc::now().to_rfc3339()),
        ]);

        let input = PutObjectInput::builder()
            .bucket(&self.storage.bucket)
            .key(&key)
            .body_path(staged.path())
            .content_type(staged.content_type())
            .metadata(metadata)
            .build();
        self.client.put_object(input).await?;

        tracing::info!(key = %key, "Uploaded object.");
        Ok(object_url(&self.storage.bucket, &self.storage.region, &key))
    }

    async fn resolve(&self, reference: &str) -> Result<ResolvedMedia, MediaStoreError> {
        match AssetLocation::parse(reference)? {
            AssetLocation::ObjectStore { key } => {
                let input = PresignGetObjectInput::builder()
                    .bucket(&self.storage.bucket)
                    .key(key)
                    .expires_in(Duration::from_secs(SIGNED_URL_TTL_SECS))
                    .build();
                let url = self.client.presign_get_object(input).await?;

                Ok(ResolvedMedia {
                    url,
                    media_type: MediaType::S3,
                    expires_in: Some(SIGNED_URL_TTL_SECS),
                })
            }
            AssetLocation::Local { path } => Ok(self.local.resolve(&path)),
        }
    }

    async fn remove(&self, reference: &str) -> Result<(), MediaStoreError> {
        match AssetLocation::parse(reference)? {
            AssetLocation::ObjectStore { key } => {
                let input = DeleteObjectInput::builder()
                    .bucket(&self.storage.bucket)
                    .key(key)
                    .build();
                Ok(self.client.delete_object(input).await?)
            }
            AssetLocation::Local { path } => self.local.remove(&path).await,
        }
    }

    fn staging_dir(&self) -> &Path {
        &self.local.staging_dir
    }
}

/// Keeps uploads in the upload directory, served statically under `/uploads`.
pub struct LocalMediaStore {
    local: LocalFiles,
}

impl LocalMediaStore {
    pub fn new(upload_dir: &Path, public_base_url: &str) -> Self {
        LocalMediaStore {
            local: LocalFiles::new(upload_dir, public_base_url),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    #[tracing::instrument(skip(self, staged), fields(file_name = %staged.file_name(), size = staged.size()))]
    async fn store(&self, owner_id: &Uuid, staged: StagedFile) -> Result<String, MediaStoreError> {
        let stored_name = staged.persist_into(&self.local.upload_dir, owner_id)?;

        tracing::info!(owner_id = %owner_id, stored_name = %stored_name, "Saved upload to local disk.");
        Ok(format!("{}{}", LOCAL_PREFIX, stored_name))
    }

    async fn resolve(&self, reference: &str) -> Result<ResolvedMedia, MediaStoreError> {
        match AssetLocation::parse(reference)? {
            AssetLocation::Local { path } => Ok(self.local.resolve(&path)),
            AssetLocation::ObjectStore { .. } => Err(MediaStoreError::NotConfigured(reference.to_string())),
        }
    }

    async fn remove(&self, reference: &str) -> Result<(), MediaStoreError> {
        match AssetLocation::parse(reference)? {
            AssetLocation::Local { path } => self.local.remove(&path).await,
            AssetLocation::ObjectStore { .. } => Err(MediaStoreError::NotConfigured(reference.to_string())),
        }
    }

    fn staging_dir(&self) -> &Path {
        &self.local.staging_dir
    }
}
