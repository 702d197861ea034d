use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::ObjectStoreError;

#[derive(Debug, TypedBuilder)]
pub struct PutObjectInput {
    #[builder(setter(into))]
    pub bucket: String,

    #[builder(setter(into))]
    pub key: String,

    /// Local file streamed as the object body.
    #[builder(setter(into))]
    pub body_path: PathBuf,

    #[builder(setter(into))]
    pub content_type: String,

    #[builder(default, setter(strip_option))]
    pub metadata: Option<HashMap<String, String>>,
}

#[async_trait]
pub trait PutObject {
    async fn put_object(&self, input: PutObjectInput) -> Result<(), ObjectStoreError>;
}

#[async_trait]
impl PutObject for Adapter {
    async fn put_object(&self, input: PutObjectInput) -> Result<(), ObjectStoreError> {
        let body = ByteStream::from_path(&input.body_path)
            .await
            .map_err(|e| ObjectStoreError::Body(Box::new(e)))?;

        self.raw
            .put_object()
            .bucket(input.bucket)
            .key(input.key)
            .content_type(input.content_type)
            .set_metadata(input.metadata)
            .body(body)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Service(Box::new(e)))?;

        Ok(())
    }
}
