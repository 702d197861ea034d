use actix_web::http::StatusCode;
use serde::Deserialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use zeroize::Zeroize;

use super::register::SessionOutput;
use super::{session_token, storage_failure};
use crate::repository::RepositoryError;
use crate::user_account::{verify_password, AccountProfile, PasswordError, UserLookup};
use crate::Context;

#[derive(Deserialize, Debug)]
pub struct AuthenticateInput {
    pub email: String,
    pub password: String,
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthenticateError {
    /// Unknown email and wrong password are reported alike.
    #[error("Invalid email or password")]
    InvalidCredentials,
}

impl OperationError for AuthenticateError {
    fn code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
        }
    }
}

#[tracing::instrument(skip_all)]
pub async fn authenticate(
    ctx: &Context,
    mut input: AuthenticateInput,
) -> Result<SessionOutput, EndpointError<AuthenticateError>> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || input.password.is_empty() {
        return Err(EndpointError::validation("Email and password are required"));
    }

    let mut account = match ctx.users.get_user(&UserLookup::ByEmail(email)).await {
        Ok(account) => account,
        Err(RepositoryError::NotFound) => return Err(EndpointError::operation(AuthenticateError::InvalidCredentials)),
        Err(e) => return Err(storage_failure("Loading user", e)),
    };

    let pass_verify_result = verify_password(&input.password, &account.password);
    input.password.zeroize();
    account.password.zeroize();

    pass_verify_result.map_err(|e| match e {
        PasswordError::Mismatch => EndpointError::operation(AuthenticateError::InvalidCredentials),
        e => storage_failure("Password verification", e),
    })?;

    let token = session_token(ctx, &account).map_err(simple_err_map!("Encoding session token failed.", EndpointError::internal()))?;

    Ok(SessionOutput {
        message: "Login successful".to_string(),
        token,
        user: AccountProfile::from(&account),
    })
}
