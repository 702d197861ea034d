use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use common_macros::hash_map;
use service_core::ddb::get_item::{GetItem, GetItemInput};
use service_core::ddb::is_condition_failed;
use service_core::ddb::put_item::{PutItem, PutItemInput};
use service_core::ddb::query::{Query, QueryInput};
use uuid::Uuid;

use super::{Enrollment, EnrollmentsRepository};
use crate::repository::RepositoryError;

const COURSE_ID_INDEX: &str = "CourseIdIndex";

pub trait ThreadSafeDdbClient: PutItem + GetItem + Query + Send + Sync {}
impl<T: PutItem + GetItem + Query + Send + Sync> ThreadSafeDdbClient for T {}

pub struct DdbEnrollmentsRepository<T: ThreadSafeDdbClient> {
    ddb: T,
    enrollments_table_name: String,
}

impl<T: ThreadSafeDdbClient> DdbEnrollmentsRepository<T> {
    pub fn new(ddb: T, enrollments_table_name: impl Into<String>) -> Self {
        Self {
            ddb,
            enrollments_table_name: enrollments_table_name.into(),
        }
    }

    async fn query_all(
        &self,
        index_name: Option<&str>,
        key_condition: &str,
        values: HashMap<String, AttributeValue>,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        let mut enrollments = Vec::new();
        let mut start_key = None;

        loop {
            let mut query_input = QueryInput::builder()
                .table_name(self.enrollments_table_name.as_str())
                .key_condition_expression(key_condition)
                .expression_attribute_values(values.clone())
                .exclusive_start_key(start_key)
                .build();
            query_input.index_name = index_name.map(str::to_string);
            let output = self.ddb.query(query_input).await.map_err(RepositoryError::other)?;

            let page: Vec<Enrollment> = serde_dynamo::from_items(output.items.unwrap_or_default())?;
            enrollments.extend(page);

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        Ok(enrollments)
    }
}

#[async_trait]
impl<T: ThreadSafeDdbClient> EnrollmentsRepository for DdbEnrollmentsRepository<T> {
    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(enrollment)?;
        let put_item_input = PutItemInput::builder()
            .table_name(self.enrollments_table_name.as_str())
            .item(item)
            .condition_expression("attribute_not_exists(UserId) AND attribute_not_exists(CourseId)")
            .build();

        self.ddb.put_item(put_item_input).await.map_err(|err| {
            if is_condition_failed(&err, PutItemError::is_conditional_check_failed_exception) {
                RepositoryError::Duplicate
            } else {
                tracing::error!(error = ?err, user_id = %enrollment.user_id, course_id = %enrollment.course_id, "Failed to write enrollment.");
                RepositoryError::other(err)
            }
        })?;

        Ok(())
    }

    async fn get_enrollment(&self, user_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>, RepositoryError> {
        let get_item_input = GetItemInput::builder()
            .table_name(self.enrollments_table_name.as_str())
            .key(hash_map! {
                "UserId".to_string() => AttributeValue::S(user_id.to_string()),
                "CourseId".to_string() => AttributeValue::S(course_id.to_string()),
            })
            .consistent_read(true)
            .build();
        let output = self.ddb.get_item(get_item_input).await.map_err(RepositoryError::other)?;

        output.item.map(serde_dynamo::from_item).transpose().map_err(RepositoryError::from)
    }

    async fn list_enrollments_by_user(&self, user_id: &Uuid) -> Result<Vec<Enrollment>, RepositoryError> {
        let values = hash_map! {
            ":user_id".to_string() => AttributeValue::S(user_id.to_string()),
        };
        self.query_all(None, "UserId = :user_id", values).await
    }

    async fn list_enrollments_by_course(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, RepositoryError> {
        let values = hash_map! {
            ":course_id".to_string() => AttributeValue::S(course_id.to_string()),
        };
        self.query_all(Some(COURSE_ID_INDEX), "CourseId = :course_id", values).await
    }
}
