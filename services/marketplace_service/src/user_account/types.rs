use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Instructor,
}

/// A user account as stored in the users table.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, TypedBuilder)]
#[serde(rename_all = "PascalCase")]
pub struct UserAccount {
    #[builder(default = Uuid::new_v4())]
    pub user_id: Uuid,

    #[builder(setter(into))]
    pub name: String,

    #[builder(setter(into))]
    pub email: String,

    /// Argon2id hash of the password.
    #[serde(default)]
    #[builder(setter(into))]
    pub password: String,

    #[serde(default)]
    #[builder(default)]
    pub role: Role,

    #[serde(default = "default_language")]
    #[builder(default = default_language(), setter(into))]
    pub language: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub bio: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub profile_picture: String,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

fn default_language() -> String {
    "en".to_string()
}

/// The part of an account that is returned to callers.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub language: String,
    pub bio: String,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for AccountProfile {
    fn from(account: &UserAccount) -> Self {
        AccountProfile {
            id: account.user_id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            language: account.language.clone(),
            bio: account.bio.clone(),
            profile_picture: account.profile_picture.clone(),
            created_at: account.created_at,
        }
    }
}
