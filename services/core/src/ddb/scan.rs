use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::scan::{ScanError, ScanOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

/// One page of a full table scan. Callers keep passing `last_evaluated_key` back as
/// `exclusive_start_key` until it comes back empty.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ScanInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(default)]
    pub exclusive_start_key: Option<HashMap<String, AttributeValue>>,
}

#[async_trait]
pub trait Scan {
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, SdkError<ScanError>>;
}

#[async_trait]
impl Scan for Adapter {
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, SdkError<ScanError>> {
        self.raw
            .scan()
            .table_name(input.table_name)
            .set_exclusive_start_key(input.exclusive_start_key)
            .send()
            .await
    }
}
