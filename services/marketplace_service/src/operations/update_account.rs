use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use super::{storage_failure, Caller};
use crate::media::{AssetKind, StagedFile};
use crate::repository::RepositoryError;
use crate::user_account::{AccountProfile, ProfileUpdate, UserLookup};
use crate::Context;

#[derive(Deserialize, Debug, Default)]
pub struct UpdateAccountInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UpdateAccountOutput {
    pub message: String,
    pub user: AccountProfile,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UpdateAccountError {
    #[error("User not found")]
    NotFound,
}

impl OperationError for UpdateAccountError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[tracing::instrument(skip(ctx, input, profile_image), fields(user_id = %caller.user_id))]
pub async fn update_account(
    ctx: &Context,
    caller: &Caller,
    input: UpdateAccountInput,
    profile_image: Option<StagedFile>,
) -> Result<UpdateAccountOutput, EndpointError<UpdateAccountError>> {
    let not_found = |e: RepositoryError| match e {
        RepositoryError::NotFound => EndpointError::operation(UpdateAccountError::NotFound),
        e => storage_failure("Updating user", e),
    };

    let name = input.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(EndpointError::validation("Name cannot be empty"));
    }

    let current = ctx.users.get_user(&UserLookup::ById(caller.user_id)).await.map_err(not_found)?;

    let mut update = ProfileUpdate {
        name,
        bio: input.bio,
        language: input.language.filter(|l| !l.trim().is_empty()),
        profile_picture: None,
    };
    if let Some(staged) = profile_image {
        let reference = ctx
            .media
            .store(&caller.user_id, staged)
            .await
            .map_err(|e| storage_failure("Storing profile image", e))?;
        update.profile_picture = Some(reference);
    }

    if update.is_empty() {
        return Ok(UpdateAccountOutput {
            message: "Profile updated successfully".to_string(),
            user: AccountProfile::from(&current),
        });
    }

    let updated = match ctx.users.update_profile(&caller.user_id, &update).await {
        Ok(updated) => updated,
        Err(err) => {
            if let Some(reference) = &update.profile_picture {
                if let Err(e) = ctx.media.remove(reference).await {
                    tracing::warn!(error = ?e, "Removing unused profile image failed.");
                }
            }
            return Err(not_found(err));
        }
    };

    if update.profile_picture.is_some() && AssetKind::ProfileImage.issued_for(&caller.user_id, &current.profile_picture) {
        if let Err(e) = ctx.media.remove(&current.profile_picture).await {
            tracing::warn!(error = ?e, reference = %current.profile_picture, "Removing replaced profile image failed.");
        }
    }

    Ok(UpdateAccountOutput {
        message: "Profile updated successfully".to_string(),
        user: AccountProfile::from(&updated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{staged_file, TestContext};
    use crate::user_account::Role;

    #[tokio::test]
    async fn updates_given_fields_only() {
        let test = TestContext::new();
        let user = test.add_user("Selam", Role::Student).await;
        let input = UpdateAccountInput {
            bio: Some("Learning Rust".to_string()),
            language: Some("ti".to_string()),
            ..Default::default()
        };

        let output = update_account(&test.ctx, &TestContext::caller(&user), input, None).await.unwrap();

        assert_eq!(output.user.name, "Selam");
        assert_eq!(output.user.bio, "Learning Rust");
        assert_eq!(output.user.language, "ti");
    }

    #[tokio::test]
    async fn new_profile_image_replaces_old_one() {
        let test = TestContext::new();
        let user = test.add_user("Selam", Role::Student).await;
        let caller = TestContext::caller(&user);

        let first = staged_file(&test.ctx, AssetKind::ProfileImage, "one.png").await;
        let first = update_account(&test.ctx, &caller, UpdateAccountInput::default(), Some(first))
            .await
            .unwrap()
            .user
            .profile_picture;
        let second = staged_file(&test.ctx, AssetKind::ProfileImage, "two.png").await;
        let second = update_account(&test.ctx, &caller, UpdateAccountInput::default(), Some(second))
            .await
            .unwrap()
            .user
            .profile_picture;

        assert_ne!(first, second);
        assert_eq!(test.stored_media(), vec![second]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let test = TestContext::new();
        let user = test.add_user("Selam", Role::Student).await;
        let input = UpdateAccountInput {
            name: Some("   ".to_string()),
            ..Default::default()
        };

        let err = update_account(&test.ctx, &TestContext::caller(&user), input, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::BAD_REQUEST);
    }
}
