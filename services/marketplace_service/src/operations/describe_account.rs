use actix_web::http::StatusCode;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use super::{storage_failure, Caller};
use crate::repository::RepositoryError;
use crate::user_account::{AccountProfile, UserLookup};
use crate::Context;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DescribeAccountError {
    #[error("User not found")]
    NotFound,
}

impl OperationError for DescribeAccountError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

pub async fn describe_account(
    ctx: &Context,
    caller: &Caller,
) -> Result<AccountProfile, EndpointError<DescribeAccountError>> {
    let account = ctx
        .users
        .get_user(&UserLookup::ById(caller.user_id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => EndpointError::operation(DescribeAccountError::NotFound),
            e => storage_failure("Loading user", e),
        })?;

    Ok(AccountProfile::from(&account))
}
