use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

/// Writes a whole item. With a `condition_expression` such as `attribute_not_exists(..)` the
/// write doubles as a uniqueness check; see [`super::is_condition_failed`].
#[derive(TypedBuilder)]
pub struct PutItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    pub item: HashMap<String, AttributeValue>,

    #[builder(default, setter(strip_option, into))]
    pub condition_expression: Option<String>,
}

#[async_trait]
pub trait PutItem {
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, SdkError<PutItemError>>;
}

#[async_trait]
impl PutItem for Adapter {
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, SdkError<PutItemError>> {
        self.raw
            .put_item()
            .table_name(input.table_name)
            .set_item(Some(input.item))
            .set_condition_expression(input.condition_expression)
            .send()
            .await
    }
}
