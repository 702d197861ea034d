use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select};
use common_macros::hash_map;
use serde::Deserialize;
use service_core::ddb::get_item::{GetItem, GetItemInput};
use service_core::ddb::is_condition_failed;
use service_core::ddb::put_item::{PutItem, PutItemInput};
use service_core::ddb::query::{Query, QueryInput};
use service_core::ddb::update_item::{UpdateItem, UpdateItemInput};
use uuid::Uuid;

use super::{ProfileUpdate, UserAccount, UserLookup, UsersRepository};
use crate::repository::{RepositoryError, SetExpression};

const USER_ID_INDEX: &str = "UserIdIndex";

pub trait ThreadSafeDdbClient: PutItem + GetItem + Query + UpdateItem + Send + Sync {}
impl<T: PutItem + GetItem + Query + UpdateItem + Send + Sync> ThreadSafeDdbClient for T {}

pub struct DdbUsersRepository<T: ThreadSafeDdbClient> {
    ddb: T,
    users_table_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserIdIndexProjection {
    email: String,
}

impl<T: ThreadSafeDdbClient> DdbUsersRepository<T> {
    pub fn new(ddb: T, users_table_name: impl Into<String>) -> Self {
        Self {
            ddb,
            users_table_name: users_table_name.into(),
        }
    }

    /// Given a user ID, create the correct DynamoDB key to interact with that item.
    async fn user_key_from_id(&self, user_id: &Uuid) -> Result<HashMap<String, AttributeValue>, RepositoryError> {
        let query_params = hash_map! {
            ":uuid".to_string() => AttributeValue::S(user_id.to_string()),
        };

        let query_input = QueryInput::builder()
            .index_name(USER_ID_INDEX)
            .table_name(self.users_table_name.as_str())
            .key_condition_expression("UserId = :uuid")
            .select(Select::AllProjectedAttributes)
            .expression_attribute_values(query_params)
            .limit(1)
            .build();
        let output = self.ddb.query(query_input).await.map_err(RepositoryError::other)?;

        let item = output
            .items
            .unwrap_or_default()
            .pop()
            .ok_or(RepositoryError::NotFound)?;
        let projection: UserIdIndexProjection = serde_dynamo::from_item(item)?;
        Ok(self.user_key_from_email(projection.email))
    }

    /// Given an email address, creates the map to be used as key to the users table.
    fn user_key_from_email(&self, email: String) -> HashMap<String, AttributeValue> {
        hash_map! {
            "Email".to_string() => AttributeValue::S(email),
        }
    }

    async fn user(&self, key: HashMap<String, AttributeValue>) -> Result<UserAccount, RepositoryError> {
        let get_item_input = GetItemInput::builder()
            .table_name(self.users_table_name.as_str())
            .key(key)
            .consistent_read(true)
            .build();
        let output = self.ddb.get_item(get_item_input).await.map_err(RepositoryError::other)?;

        match output.item {
            None => Err(RepositoryError::NotFound),
            Some(item) => Ok(serde_dynamo::from_item(item)?),
        }
    }
}

#[async_trait]
impl<T: ThreadSafeDdbClient> UsersRepository for DdbUsersRepository<T> {
    async fn create_user(&self, user: &UserAccount) -> Result<(), RepositoryError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(user)?;
        let put_item_input = PutItemInput::builder()
            .table_name(self.users_table_name.as_str())
            .item(item)
            .condition_expression("attribute_not_exists(Email)")
            .build();

        self.ddb.put_item(put_item_input).await.map_err(|err| {
            if is_condition_failed(&err, PutItemError::is_conditional_check_failed_exception) {
                RepositoryError::Duplicate
            } else {
                RepositoryError::other(err)
            }
        })?;

        Ok(())
    }

    async fn get_user(&self, lookup: &UserLookup) -> Result<UserAccount, RepositoryError> {
        let key = match lookup {
            UserLookup::ByEmail(email) => self.user_key_from_email(email.clone()),
            UserLookup::ById(id) => self.user_key_from_id(id).await?,
        };
        self.user(key).await
    }

    async fn update_profile(&self, user_id: &Uuid, update: &ProfileUpdate) -> Result<UserAccount, RepositoryError> {
        let key = self.user_key_from_id(user_id).await?;
        if update.is_empty() {
            return self.user(key).await;
        }

        let mut set = SetExpression::default();
        if let Some(name) = &update.name {
            set.set("Name", name)?;
        }
        if let Some(bio) = &update.bio {
            set.set("Bio", bio)?;
        }
        if let Some(language) = &update.language {
            set.set("Language", language)?;
        }
        if let Some(picture) = &update.profile_picture {
            set.set("ProfilePicture", picture)?;
        }
        let (expression, names, values) = set.into_parts();

        let update_item_input = UpdateItemInput::builder()
            .table_name(self.users_table_name.as_str())
            .key(key)
            .update_expression(expression)
            .condition_expression("attribute_exists(Email)")
            .expression_attribute_names(names)
            .expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .build();
        let output = self
            .ddb
            .update_item(update_item_input)
            .await
            .map_err(RepositoryError::other)?;

        let attributes = output
            .attributes
            .ok_or_else(|| RepositoryError::other("Malformed reply: missing attributes"))?;
        Ok(serde_dynamo::from_item(attributes)?)
    }
}
