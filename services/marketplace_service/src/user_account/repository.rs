use async_trait::async_trait;
use uuid::Uuid;

use super::UserAccount;
use crate::repository::RepositoryError;

#[derive(Clone, Debug)]
pub enum UserLookup {
    ById(Uuid),
    ByEmail(String),
}

/// Profile fields a user may change on their own account. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub language: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.bio.is_none() && self.language.is_none() && self.profile_picture.is_none()
    }

    pub fn apply(&self, account: &mut UserAccount) {
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(bio) = &self.bio {
            account.bio = bio.clone();
        }
        if let Some(language) = &self.language {
            account.language = language.clone();
        }
        if let Some(picture) = &self.profile_picture {
            account.profile_picture = picture.clone();
        }
    }
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Stores a new account. Fails with `RepositoryError::Duplicate` when the email is taken.
    async fn create_user(&self, user: &UserAccount) -> Result<(), RepositoryError>;

    async fn get_user(&self, lookup: &UserLookup) -> Result<UserAccount, RepositoryError>;

    async fn update_profile(&self, user_id: &Uuid, update: &ProfileUpdate) -> Result<UserAccount, RepositoryError>;
}
