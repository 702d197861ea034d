use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use super::list_instructor_courses::{require_instructor, InstructorOnlyError};
use super::{courses_with_enrollments, storage_failure, Caller};
use crate::Context;

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueEntry {
    pub course_id: Uuid,
    pub course_title: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

/// One entry per enrollment in the caller's courses, most recent first.
pub async fn instructor_revenue(
    ctx: &Context,
    caller: &Caller,
) -> Result<Vec<RevenueEntry>, EndpointError<InstructorOnlyError>> {
    require_instructor(caller)?;

    let courses = courses_with_enrollments(ctx, &caller.user_id)
        .await
        .map_err(|e| storage_failure("Loading instructor enrollments", e))?;

    let mut entries: Vec<_> = courses
        .iter()
        .flat_map(|(course, enrollments)| {
            enrollments.iter().map(move |e| RevenueEntry {
                course_id: course.course_id,
                course_title: course.title.clone(),
                amount: e.amount,
                date: e.enrolled_at,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(entries)
}
