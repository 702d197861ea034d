use std::str::FromStr;

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;
use zeroize::Zeroize;

use super::{session_token, storage_failure, validation_message};
use crate::media::StagedFile;
use crate::repository::RepositoryError;
use crate::user_account::{hash_password, AccountProfile, Role, UserAccount};
use crate::Context;

#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub message: String,
    pub token: String,
    pub user: AccountProfile,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("User already exists with this email")]
    AlreadyExists,
}

impl OperationError for RegisterError {
    fn code(&self) -> StatusCode {
        match self {
            RegisterError::AlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[tracing::instrument(skip_all, fields(email = %input.email))]
pub async fn register(
    ctx: &Context,
    mut input: RegisterInput,
    profile_image: Option<StagedFile>,
) -> Result<SessionOutput, EndpointError<RegisterError>> {
    input.name = input.name.trim().to_string();
    input.email = input.email.trim().to_lowercase();
    input
        .validate()
        .map_err(|e| EndpointError::validation(validation_message(&e)))?;

    let role = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(role) => Role::from_str(role).map_err(|_| EndpointError::validation("Role must be student or instructor"))?,
        None => Role::default(),
    };

    let password = hash_password(&input.password).map_err(simple_err_map!("Hashing password failed.", EndpointError::internal()))?;
    input.password.zeroize();

    let user_id = Uuid::new_v4();
    let profile_picture = match profile_image {
        Some(staged) => ctx
            .media
            .store(&user_id, staged)
            .await
            .map_err(|e| storage_failure("Storing profile image", e))?,
        None => String::new(),
    };

    let mut account = UserAccount::builder()
        .user_id(user_id)
        .name(input.name)
        .email(input.email)
        .password(password)
        .role(role)
        .profile_picture(profile_picture)
        .build();
    if let Some(language) = input.language.filter(|l| !l.trim().is_empty()) {
        account.language = language;
    }

    if let Err(err) = ctx.users.create_user(&account).await {
        if !account.profile_picture.is_empty() {
            if let Err(e) = ctx.media.remove(&account.profile_picture).await {
                tracing::warn!(error = ?e, "Removing profile image of failed registration failed.");
            }
        }
        return Err(match err {
            RepositoryError::Duplicate => EndpointError::operation(RegisterError::AlreadyExists),
            e => storage_failure("Creating user", e),
        });
    }

    let token = session_token(ctx, &account).map_err(simple_err_map!("Encoding session token failed.", EndpointError::internal()))?;
    account.password.zeroize();
    tracing::info!(user_id = %account.user_id, role = %account.role.as_ref(), "Registered user.");

    Ok(SessionOutput {
        message: "User registered successfully".to_string(),
        token,
        user: AccountProfile::from(&account),
    })
}
