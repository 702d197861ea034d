use aws_sdk_dynamodb::Client as RawClient;

/// Thin wrapper over the DynamoDB client, so repositories can be written against the operation
/// traits of this module instead of the SDK itself.
#[derive(Debug, Clone)]
pub struct Adapter {
    pub(crate) raw: RawClient,
}

impl From<RawClient> for Adapter {
    fn from(raw: RawClient) -> Self {
        Adapter { raw }
    }
}
