use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemError, DeleteItemOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

#[derive(TypedBuilder, Debug)]
pub struct DeleteItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    pub key: HashMap<String, AttributeValue>,
}

/// Deleting a missing item succeeds.
#[async_trait]
pub trait DeleteItem {
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, SdkError<DeleteItemError>>;
}

#[async_trait]
impl DeleteItem for Adapter {
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, SdkError<DeleteItemError>> {
        self.raw
            .delete_item()
            .table_name(input.table_name)
            .set_key(Some(input.key))
            .send()
            .await
    }
}
