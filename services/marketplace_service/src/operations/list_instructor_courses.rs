use actix_web::http::StatusCode;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use super::views::CourseView;
use super::{storage_failure, Caller};
use crate::Context;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum InstructorOnlyError {
    #[error("Access denied. Instructor role required.")]
    NotAuthorized,
}

impl OperationError for InstructorOnlyError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotAuthorized => StatusCode::FORBIDDEN,
        }
    }
}

pub(crate) fn require_instructor(caller: &Caller) -> Result<(), EndpointError<InstructorOnlyError>> {
    if caller.is_instructor() {
        Ok(())
    } else {
        Err(EndpointError::operation(InstructorOnlyError::NotAuthorized))
    }
}

/// The caller's own courses, newest first, with the edit policy each one is under.
pub async fn list_instructor_courses(
    ctx: &Context,
    caller: &Caller,
) -> Result<Vec<CourseView>, EndpointError<InstructorOnlyError>> {
    require_instructor(caller)?;

    let mut courses = ctx
        .courses
        .list_courses_by_instructor(&caller.user_id)
        .await
        .map_err(|e| storage_failure("Listing instructor courses", e))?;
    courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(courses
        .iter()
        .map(|course| CourseView::from(course).with_edit_policy(course))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{CourseStatus, EditPolicy};
    use crate::testing::TestContext;
    use crate::user_account::Role;

    #[tokio::test]
    async fn lists_own_courses_with_policy() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let other = test.add_user("Dawit", Role::Instructor).await;
        let student = test.add_user("Hana", Role::Student).await;
        let draft = test.add_course(&instructor, CourseStatus::Draft, false).await;
        let live = test.add_course(&instructor, CourseStatus::Active, true).await;
        test.add_course(&other, CourseStatus::Active, true).await;
        test.add_enrollment(&student, &live).await;

        let listed = list_instructor_courses(&test.ctx, &TestContext::caller(&instructor))
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, live.course_id);
        assert_eq!(listed[0].edit_policy, Some(EditPolicy::Restricted));
        assert_eq!(listed[0].enrollment_count, 1);
        assert_eq!(listed[1].id, draft.course_id);
        assert_eq!(listed[1].edit_policy, Some(EditPolicy::Full));
    }

    #[tokio::test]
    async fn students_are_rejected() {
        let test = TestContext::new();
        let student = test.add_user("Hana", Role::Student).await;

        let err = list_instructor_courses(&test.ctx, &TestContext::caller(&student))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Access denied. Instructor role required.");
    }
}
