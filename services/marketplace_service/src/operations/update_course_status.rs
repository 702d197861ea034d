use std::str::FromStr;

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::views::CourseView;
use super::{storage_failure, Caller};
use crate::course::lifecycle::check_transition;
use crate::course::{CourseStatus, TransitionError};
use crate::repository::RepositoryError;
use crate::Context;

#[derive(Deserialize, Debug)]
pub struct UpdateCourseStatusInput {
    pub status: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseStatusOutput {
    pub message: String,
    pub course: CourseView,
    pub previous_status: CourseStatus,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UpdateCourseStatusError {
    #[error("Course not found")]
    NotFound,

    #[error("Only the course instructor can update course status")]
    NotAuthorized,

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("The course changed while its status was being updated. Please try again.")]
    ConcurrentChange,
}

impl OperationError for UpdateCourseStatusError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::InvalidTransition(_) | Self::ConcurrentChange => StatusCode::CONFLICT,
        }
    }
}

/// Moves the course to the requested status. The write only succeeds if the stored status is still
/// the one the guards were checked against.
#[tracing::instrument(skip(ctx, input), fields(user_id = %caller.user_id, status = %input.status))]
pub async fn update_course_status(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
    input: &UpdateCourseStatusInput,
) -> Result<UpdateCourseStatusOutput, EndpointError<UpdateCourseStatusError>> {
    let status = CourseStatus::from_str(input.status.trim())
        .map_err(|_| EndpointError::validation("Invalid status. Must be one of: draft, active, closed, archived"))?;

    let not_found = |e: RepositoryError| match e {
        RepositoryError::NotFound => EndpointError::operation(UpdateCourseStatusError::NotFound),
        e => storage_failure("Loading course", e),
    };
    let course = ctx.courses.get_course(course_id).await.map_err(not_found)?;
    if !course.is_owned_by(&caller.user_id) {
        return Err(EndpointError::operation(UpdateCourseStatusError::NotAuthorized));
    }

    let previous_status = course.effective_status();
    check_transition(&course, status).map_err(|e| EndpointError::operation(UpdateCourseStatusError::from(e)))?;

    let updated = match ctx.courses.update_status(course_id, course.status, status).await {
        Ok(updated) => updated,
        Err(RepositoryError::ConditionFailed) => {
            // Report the guard that fails now, if any.
            let current = ctx.courses.get_course(course_id).await.map_err(not_found)?;
            check_transition(&current, status).map_err(|e| EndpointError::operation(UpdateCourseStatusError::from(e)))?;
            return Err(EndpointError::operation(UpdateCourseStatusError::ConcurrentChange));
        }
        Err(e) => return Err(storage_failure("Updating course status", e)),
    };
    tracing::info!(course_id = %course_id, from = %previous_status, to = %status, "Changed course status.");

    Ok(UpdateCourseStatusOutput {
        message: format!("Course status updated to {}", status),
        course: CourseView::from(&updated),
        previous_status,
    })
}
