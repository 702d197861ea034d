use async_trait::async_trait;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::ObjectStoreError;

#[derive(Debug, TypedBuilder)]
pub struct DeleteObjectInput {
    #[builder(setter(into))]
    pub bucket: String,

    #[builder(setter(into))]
    pub key: String,
}

#[async_trait]
pub trait DeleteObject {
    async fn delete_object(&self, input: DeleteObjectInput) -> Result<(), ObjectStoreError>;
}

#[async_trait]
impl DeleteObject for Adapter {
    async fn delete_object(&self, input: DeleteObjectInput) -> Result<(), ObjectStoreError> {
        self.raw
            .delete_object()
            .bucket(input.bucket)
            .key(input.key)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Service(Box::new(e)))?;

        Ok(())
    }
}
