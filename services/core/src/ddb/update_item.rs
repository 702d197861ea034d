use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::update_item::{UpdateItemError, UpdateItemOutput};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

/// A conditional in-place update. The condition is mandatory: at the very least it must assert
/// that the item exists, otherwise DynamoDB would create a partial item.
#[derive(TypedBuilder, Clone, Debug)]
pub struct UpdateItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    pub key: HashMap<String, AttributeValue>,

    #[builder(setter(into))]
    pub update_expression: String,

    #[builder(setter(into))]
    pub condition_expression: String,

    /// Left out of the request when empty, since DynamoDB rejects an empty map.
    #[builder(default)]
    pub expression_attribute_names: HashMap<String, String>,

    pub expression_attribute_values: HashMap<String, AttributeValue>,

    pub return_values: ReturnValue,
}

#[async_trait]
pub trait UpdateItem {
    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, SdkError<UpdateItemError>>;
}

#[async_trait]
impl UpdateItem for Adapter {
    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, SdkError<UpdateItemError>> {
        let names = Some(input.expression_attribute_names).filter(|names| !names.is_empty());

        self.raw
            .update_item()
            .table_name(input.table_name)
            .set_key(Some(input.key))
            .update_expression(input.update_expression)
            .condition_expression(input.condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(Some(input.expression_attribute_values))
            .return_values(input.return_values)
            .send()
            .await
    }
}
