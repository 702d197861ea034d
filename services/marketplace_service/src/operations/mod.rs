pub mod authenticate;
pub mod create_course;
pub mod create_course_with_media;
pub mod describe_account;
pub mod describe_course;
pub mod enroll;
pub mod enrollment_status;
pub mod filter_options;
pub mod get_media_url;
pub mod instructor_enrollments;
pub mod instructor_revenue;
pub mod instructor_stats;
pub mod list_courses;
pub mod list_enrolled_courses;
pub mod list_instructor_courses;
pub mod payment_history;
pub mod post_review;
pub mod register;
pub mod update_account;
pub mod update_course;
pub mod update_course_status;
pub mod upload_course_asset;
pub mod views;

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use service_core::auth::jwt::{issue_token, Claims};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::course::Course;
use crate::enrollment::Enrollment;
use crate::repository::RepositoryError;
use crate::user_account::{Role, UserAccount, UserLookup};
use crate::Context;

/// The authenticated user a request is made on behalf of, as named by its bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

/// Logs a failure of the storage layer and hides it behind an internal error.
pub(crate) fn storage_failure<E: OperationError>(action: &str, err: impl Debug) -> EndpointError<E> {
    tracing::error!(error = ?err, "{} failed.", action);
    EndpointError::internal()
}

/// First validation message, by field name, so that the reply does not depend on hash order.
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    fields
        .first()
        .and_then(|field| {
            field_errors[**field]
                .first()
                .map(|e| e.message.as_ref().map_or_else(|| format!("Invalid {}.", field), |m| m.to_string()))
        })
        .unwrap_or_else(|| "Invalid input.".to_string())
}

pub(crate) fn session_token(ctx: &Context, account: &UserAccount) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(account.user_id.to_string(), account.role.as_ref());
    issue_token(&ctx.settings.jwt_secret, &claims)
}

/// Accepts a value either in its own JSON type or as text, the way multipart form fields carry it.
/// Blank text counts as absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Value(T),
        Text(String),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Value(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Loads the accounts with the given ids. Ids without an account are left out.
pub(crate) async fn users_by_id(
    ctx: &Context,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, UserAccount>, RepositoryError> {
    let ids: HashSet<Uuid> = ids.into_iter().collect();
    let mut users = HashMap::with_capacity(ids.len());

    for id in ids {
        match ctx.users.get_user(&UserLookup::ById(id)).await {
            Ok(user) => {
                users.insert(id, user);
            }
            Err(RepositoryError::NotFound) => tracing::warn!(user_id = %id, "Referenced user does not exist."),
            Err(e) => return Err(e),
        }
    }

    Ok(users)
}

/// The instructor's courses, each with the enrollments made in it.
pub(crate) async fn courses_with_enrollments(
    ctx: &Context,
    instructor_id: &Uuid,
) -> Result<Vec<(Course, Vec<Enrollment>)>, RepositoryError> {
    let courses = ctx.courses.list_courses_by_instructor(instructor_id).await?;
    let mut result = Vec::with_capacity(courses.len());

    for course in courses {
        let enrollments = ctx.enrollments.list_enrollments_by_course(&course.course_id).await?;
        result.push((course, enrollments));
    }

    Ok(result)
}
