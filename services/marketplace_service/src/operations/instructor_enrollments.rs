use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use super::list_instructor_courses::{require_instructor, InstructorOnlyError};
use super::views::UserSummary;
use super::{courses_with_enrollments, storage_failure, users_by_id, Caller};
use crate::enrollment::EnrollmentView;
use crate::Context;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
}

#[derive(Serialize, Debug)]
pub struct InstructorEnrollment {
    #[serde(flatten)]
    pub enrollment: EnrollmentView,
    pub course: CourseSummary,
    pub student: Option<UserSummary>,
}

/// Enrollments in the caller's courses with the enrolled students, most recent first.
pub async fn instructor_enrollments(
    ctx: &Context,
    caller: &Caller,
) -> Result<Vec<InstructorEnrollment>, EndpointError<InstructorOnlyError>> {
    require_instructor(caller)?;

    let courses = courses_with_enrollments(ctx, &caller.user_id)
        .await
        .map_err(|e| storage_failure("Loading instructor enrollments", e))?;
    let students = users_by_id(
        ctx,
        courses.iter().flat_map(|(_, enrollments)| enrollments.iter().map(|e| e.user_id)),
    )
    .await
    .map_err(|e| storage_failure("Loading students", e))?;

    let mut result: Vec<_> = courses
        .iter()
        .flat_map(|(course, enrollments)| {
            let students = &students;
            enrollments.iter().map(move |e| InstructorEnrollment {
                enrollment: EnrollmentView::from(e),
                course: CourseSummary {
                    id: course.course_id,
                    title: course.title.clone(),
                },
                student: students.get(&e.user_id).map(UserSummary::from),
            })
        })
        .collect();
    result.sort_by(|a, b| b.enrollment.enrolled_at.cmp(&a.enrollment.enrolled_at));

    Ok(result)
}
