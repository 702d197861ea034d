use actix_web::http::StatusCode;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::views::CourseView;
use super::{storage_failure, users_by_id, Caller};
use crate::repository::RepositoryError;
use crate::Context;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DescribeCourseError {
    #[error("Course not found")]
    NotFound,
}

impl OperationError for DescribeCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// One course with its instructor. The owner counts as enrolled in their own course.
pub async fn describe_course(
    ctx: &Context,
    caller: Option<&Caller>,
    course_id: &Uuid,
) -> Result<CourseView, EndpointError<DescribeCourseError>> {
    let course = ctx.courses.get_course(course_id).await.map_err(|e| match e {
        RepositoryError::NotFound => EndpointError::operation(DescribeCourseError::NotFound),
        e => storage_failure("Loading course", e),
    })?;
    let instructors = users_by_id(ctx, [course.instructor_id])
        .await
        .map_err(|e| storage_failure("Loading instructor", e))?;

    let view = CourseView::from(&course).with_instructor(instructors.get(&course.instructor_id));
    let Some(caller) = caller else {
        return Ok(view);
    };

    let enrolled = course.is_owned_by(&caller.user_id)
        || ctx
            .enrollments
            .get_enrollment(&caller.user_id, course_id)
            .await
            .map_err(|e| storage_failure("Loading enrollment", e))?
            .is_some();

    Ok(view.with_enrolled(enrolled))
}
