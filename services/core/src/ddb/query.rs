use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::query::{QueryError, QueryOutput};
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

/// One page of items sharing a partition key, on the table or on one of its secondary indexes.
#[derive(Debug, Clone, TypedBuilder)]
pub struct QueryInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(default, setter(strip_option, into))]
    pub index_name: Option<String>,

    #[builder(setter(into))]
    pub key_condition_expression: String,

    pub expression_attribute_values: HashMap<String, AttributeValue>,

    #[builder(default, setter(strip_option))]
    pub select: Option<Select>,

    #[builder(default, setter(strip_option))]
    pub limit: Option<i32>,

    #[builder(default)]
    pub exclusive_start_key: Option<HashMap<String, AttributeValue>>,
}

#[async_trait]
pub trait Query {
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, SdkError<QueryError>>;
}

#[async_trait]
impl Query for Adapter {
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, SdkError<QueryError>> {
        self.raw
            .query()
            .table_name(input.table_name)
            .set_index_name(input.index_name)
            .key_condition_expression(input.key_condition_expression)
            .set_expression_attribute_values(Some(input.expression_attribute_values))
            .set_select(input.select)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
            .send()
            .await
    }
}
