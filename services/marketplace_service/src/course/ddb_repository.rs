use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use chrono::Utc;
use common_macros::hash_map;
use service_core::ddb::delete_item::{DeleteItem, DeleteItemInput};
use service_core::ddb::get_item::{GetItem, GetItemInput};
use service_core::ddb::is_condition_failed;
use service_core::ddb::put_item::{PutItem, PutItemInput};
use service_core::ddb::query::{Query, QueryInput};
use service_core::ddb::scan::{Scan, ScanInput};
use service_core::ddb::update_item::{UpdateItem, UpdateItemInput};
use uuid::Uuid;

use super::lifecycle::published_flag;
use super::{Course, CourseChanges, CourseStatus, CoursesRepository, Review};
use crate::repository::{RepositoryError, SetExpression};

const INSTRUCTOR_ID_INDEX: &str = "InstructorIdIndex";

pub trait ThreadSafeDdbClient: PutItem + GetItem + Query + Scan + UpdateItem + DeleteItem + Send + Sync {}
impl<T: PutItem + GetItem + Query + Scan + UpdateItem + DeleteItem + Send + Sync> ThreadSafeDdbClient for T {}

pub struct DdbCoursesRepository<T: ThreadSafeDdbClient> {
    ddb: T,
    courses_table_name: String,
}

impl<T: ThreadSafeDdbClient> DdbCoursesRepository<T> {
    pub fn new(ddb: T, courses_table_name: impl Into<String>) -> Self {
        Self {
            ddb,
            courses_table_name: courses_table_name.into(),
        }
    }

    fn course_key(&self, course_id: &Uuid) -> HashMap<String, AttributeValue> {
        hash_map! {
            "CourseId".to_string() => AttributeValue::S(course_id.to_string()),
        }
    }

    /// Runs the update and decodes the full item it returns. A failed condition is reported as
    /// `ConditionFailed`; callers that need to tell a missing course apart look it up first.
    async fn update(&self, input: UpdateItemInput) -> Result<Course, RepositoryError> {
        let output = self.ddb.update_item(input).await.map_err(|err| {
            if is_condition_failed(&err, UpdateItemError::is_conditional_check_failed_exception) {
                RepositoryError::ConditionFailed
            } else {
                RepositoryError::other(err)
            }
        })?;

        let attributes = output
            .attributes
            .ok_or_else(|| RepositoryError::other("Malformed reply: missing attributes"))?;
        Ok(serde_dynamo::from_item(attributes)?)
    }
}

#[async_trait]
impl<T: ThreadSafeDdbClient> CoursesRepository for DdbCoursesRepository<T> {
    async fn create_course(&self, course: &Course) -> Result<(), RepositoryError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(course)?;
        let put_item_input = PutItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .item(item)
            .condition_expression("attribute_not_exists(CourseId)")
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

    async fn get_course(&self, course_id: &Uuid) -> Result<Course, RepositoryError> {
        let get_item_input = GetItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .key(self.course_key(course_id))
            .consistent_read(true)
            .build();
        let output = self.ddb.get_item(get_item_input).await.map_err(RepositoryError::other)?;

        match output.item {
            None => Err(RepositoryError::NotFound),
            Some(item) => Ok(serde_dynamo::from_item(item)?),
        }
    }

    async fn list_courses(&self) -> Result<Vec<Course>, RepositoryError> {
        let mut courses = Vec::new();
        let mut start_key = None;

        loop {
            let scan_input = ScanInput::builder()
                .table_name(self.courses_table_name.as_str())
                .exclusive_start_key(start_key)
                .build();
            let output = self.ddb.scan(scan_input).await.map_err(RepositoryError::other)?;

            let page: Vec<Course> = serde_dynamo::from_items(output.items.unwrap_or_default())?;
            courses.extend(page);

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        Ok(courses)
    }

    async fn list_courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>, RepositoryError> {
        let mut courses = Vec::new();
        let mut start_key = None;

        loop {
            let query_input = QueryInput::builder()
                .table_name(self.courses_table_name.as_str())
                .index_name(INSTRUCTOR_ID_INDEX)
                .key_condition_expression("InstructorId = :instructor_id")
                .expression_attribute_values(hash_map! {
                    ":instructor_id".to_string() => AttributeValue::S(instructor_id.to_string()),
                })
                .exclusive_start_key(start_key)
                .build();
            let output = self.ddb.query(query_input).await.map_err(RepositoryError::other)?;

            let page: Vec<Course> = serde_dynamo::from_items(output.items.unwrap_or_default())?;
            courses.extend(page);

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        Ok(courses)
    }

    async fn update_details(&self, course_id: &Uuid, changes: &CourseChanges) -> Result<Course, RepositoryError> {
        let mut set = SetExpression::default();
        if let Some(title) = &changes.title {
            set.set("Title", title)?;
        }
        if let Some(description) = &changes.description {
            set.set("Description", description)?;
        }
        if let Some(price) = changes.price {
            set.set("Price", price)?;
        }
        if let Some(category) = &changes.category {
            set.set("Category", category)?;
        }
        if let Some(level) = &changes.level {
            set.set("Level", level)?;
        }
        if let Some(language) = &changes.language {
            set.set("Language", language)?;
        }
        if let Some(duration) = changes.duration {
            set.set("Duration", duration)?;
        }
        if let Some(video_url) = &changes.video_url {
            set.set("VideoUrl", video_url)?;
        }
        if let Some(thumbnail) = &changes.thumbnail {
            set.set("Thumbnail", thumbnail)?;
        }
        set.set("UpdatedAt", Utc::now())?;
        let (expression, names, values) = set.into_parts();

        let input = UpdateItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .key(self.course_key(course_id))
            .update_expression(expression)
            .condition_expression("attribute_exists(CourseId)")
            .expression_attribute_names(names)
            .expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .build();

        self.update(input).await.map_err(|e| match e {
            RepositoryError::ConditionFailed => RepositoryError::NotFound,
            e => e,
        })
    }

    async fn update_status(
        &self,
        course_id: &Uuid,
        expected: Option<CourseStatus>,
        status: CourseStatus,
    ) -> Result<Course, RepositoryError> {
        let mut set = SetExpression::default();
        set.set("Status", status)?;
        if let Some(published) = published_flag(status) {
            set.set("IsPublished", published)?;
        }
        set.set("UpdatedAt", Utc::now())?;

        let mut conditions = vec!["attribute_exists(CourseId)".to_string()];
        match expected {
            Some(expected) => {
                conditions.push("#Status = :expected_status".to_string());
                set.value(":expected_status", AttributeValue::S(expected.to_string()));
            }
            None => conditions.push("attribute_not_exists(#Status)".to_string()),
        }
        if status == CourseStatus::Archived {
            conditions.push("(attribute_not_exists(EnrollmentCount) OR EnrollmentCount = :zero)".to_string());
            set.value(":zero", AttributeValue::N("0".to_string()));
        }
        let (expression, names, values) = set.into_parts();

        let input = UpdateItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .key(self.course_key(course_id))
            .update_expression(expression)
            .condition_expression(conditions.join(" AND "))
            .expression_attribute_names(names)
            .expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .build();

        self.update(input).await
    }

    async fn increment_enrollment_count(&self, course_id: &Uuid) -> Result<u64, RepositoryError> {
        let input = UpdateItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .key(self.course_key(course_id))
            .update_expression("ADD EnrollmentCount :one")
            .condition_expression("attribute_exists(CourseId)")
            .expression_attribute_values(hash_map! {
                ":one".to_string() => AttributeValue::N("1".to_string()),
            })
            .return_values(ReturnValue::UpdatedNew)
            .build();
        let output = self.ddb.update_item(input).await.map_err(|err| {
            if is_condition_failed(&err, UpdateItemError::is_conditional_check_failed_exception) {
                RepositoryError::NotFound
            } else {
                RepositoryError::other(err)
            }
        })?;

        let count = output
            .attributes
            .as_ref()
            .and_then(|attrs| attrs.get("EnrollmentCount"))
            .ok_or_else(|| RepositoryError::other("Malformed reply: missing EnrollmentCount"))?;
        Ok(serde_dynamo::from_attribute_value(count.clone())?)
    }

    async fn add_review(
        &self,
        course_id: &Uuid,
        review: &Review,
        rating: f64,
        expected_review_count: u32,
    ) -> Result<Course, RepositoryError> {
        let mut set = SetExpression::default();
        set.clause("Reviews = list_append(if_not_exists(Reviews, :no_reviews), :review)")
            .value(":no_reviews", AttributeValue::L(Vec::new()))
            .value(":review", serde_dynamo::to_attribute_value(vec![review])?);
        set.set("Rating", rating)?;
        set.set("ReviewCount", expected_review_count + 1)?;
        set.set("UpdatedAt", Utc::now())?;
        set.value(":expected_count", serde_dynamo::to_attribute_value(expected_review_count)?);
        let (expression, names, values) = set.into_parts();

        let condition = if expected_review_count == 0 {
            "attribute_exists(CourseId) AND (attribute_not_exists(#ReviewCount) OR #ReviewCount = :expected_count)"
        } else {
            "attribute_exists(CourseId) AND #ReviewCount = :expected_count"
        };
        let input = UpdateItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .key(self.course_key(course_id))
            .update_expression(expression)
            .condition_expression(condition)
            .expression_attribute_names(names)
            .expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .build();

        self.update(input).await
    }

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), RepositoryError> {
        let input = DeleteItemInput::builder()
            .table_name(self.courses_table_name.as_str())
            .key(self.course_key(course_id))
            .build();
        self.ddb.delete_item(input).await.map_err(RepositoryError::other)?;

        Ok(())
    }
}
