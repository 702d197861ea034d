use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::ObjectStoreError;

#[derive(Debug, TypedBuilder)]
pub struct PresignGetObjectInput {
    #[builder(setter(into))]
    pub bucket: String,

    #[builder(setter(into))]
    pub key: String,

    pub expires_in: Duration,
}

#[async_trait]
pub trait PresignGetObject {
    /// Returns a URL granting read access to the object until `expires_in` elapses.
    async fn presign_get_object(&self, input: PresignGetObjectInput) -> Result<String, ObjectStoreError>;
}

#[async_trait]
impl PresignGetObject for Adapter {
    async fn presign_get_object(&self, input: PresignGetObjectInput) -> Result<String, ObjectStoreError> {
        let config =
            PresigningConfig::expires_in(input.expires_in).map_err(|e| ObjectStoreError::Presigning(Box::new(e)))?;

        let request = self
            .raw
            .get_object()
            .bucket(input.bucket)
            .key(input.key)
            .presigned(config)
            .await
            .map_err(|e| ObjectStoreError::Presigning(Box::new(e)))?;

        Ok(request.uri().to_string())
    }
}
