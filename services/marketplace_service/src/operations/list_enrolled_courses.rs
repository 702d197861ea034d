use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;

use super::views::CourseView;
use super::{storage_failure, users_by_id, Caller};
use crate::enrollment::EnrollmentView;
use crate::repository::RepositoryError;
use crate::Context;

#[derive(Serialize, Debug)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub enrollment: EnrollmentView,
    pub course: CourseView,
}

/// The caller's enrollments with their courses, most recent first. Enrollments whose course no
/// longer exists are left out.
pub async fn list_enrolled_courses(
    ctx: &Context,
    caller: &Caller,
) -> Result<Vec<EnrolledCourse>, EndpointError<Infallible>> {
    let mut enrollments = ctx
        .enrollments
        .list_enrollments_by_user(&caller.user_id)
        .await
        .map_err(|e| storage_failure("Listing enrollments", e))?;
    enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));

    let mut courses = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        match ctx.courses.get_course(&enrollment.course_id).await {
            Ok(course) => courses.push((enrollment, course)),
            Err(RepositoryError::NotFound) => {
                tracing::warn!(course_id = %enrollment.course_id, "Enrollment refers to a missing course.")
            }
            Err(e) => return Err(storage_failure("Loading course", e)),
        }
    }
    let instructors = users_by_id(ctx, courses.iter().map(|(_, c)| c.instructor_id))
        .await
        .map_err(|e| storage_failure("Loading instructors", e))?;

    Ok(courses
        .into_iter()
        .map(|(enrollment, course)| EnrolledCourse {
            enrollment: EnrollmentView::from(enrollment),
            course: CourseView::from(&course).with_instructor(instructors.get(&course.instructor_id)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseStatus;
    use crate::testing::TestContext;
    use crate::user_account::Role;

    #[tokio::test]
    async fn lists_courses_with_instructor_newest_first() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let first = test.add_course(&instructor, CourseStatus::Active, true).await;
        let second = test.add_course(&instructor, CourseStatus::Active, true).await;
        test.add_enrollment(&student, &first).await;
        test.add_enrollment(&student, &second).await;

        let listed = list_enrolled_courses(&test.ctx, &TestContext::caller(&student)).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].course.id, second.course_id);
        assert_eq!(listed[0].course.instructor.as_ref().unwrap().email, instructor.email);
        let json = serde_json::to_value(&listed[0]).unwrap();
        assert_eq!(json["paymentStatus"], "completed");
        assert_eq!(json["course"]["title"], second.title);
    }
}
