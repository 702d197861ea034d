pub mod adapter;
pub mod delete_item;
pub mod get_item;
pub mod put_item;
pub mod query;
pub mod scan;
pub mod update_item;

pub use adapter::Adapter;

use aws_sdk_dynamodb::error::SdkError;

/// Returns `true` when the request was rejected because its condition expression evaluated to
/// false.
pub fn is_condition_failed<E, R>(err: &SdkError<E, R>, check: impl Fn(&E) -> bool) -> bool {
    err.as_service_error().map(check).unwrap_or(false)
}
