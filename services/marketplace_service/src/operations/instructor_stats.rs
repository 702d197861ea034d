use serde::Serialize;
use service_core::endpoint_error::EndpointError;

use super::list_instructor_courses::{require_instructor, InstructorOnlyError};
use super::{courses_with_enrollments, storage_failure, Caller};
use crate::Context;

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructorStats {
    pub total_courses: usize,
    pub total_enrollments: usize,
    pub total_revenue: f64,
}

pub async fn instructor_stats(
    ctx: &Context,
    caller: &Caller,
) -> Result<InstructorStats, EndpointError<InstructorOnlyError>> {
    require_instructor(caller)?;

    let courses = courses_with_enrollments(ctx, &caller.user_id)
        .await
        .map_err(|e| storage_failure("Loading instructor enrollments", e))?;

    Ok(InstructorStats {
        total_courses: courses.len(),
        total_enrollments: courses.iter().map(|(_, e)| e.len()).sum(),
        total_revenue: courses.iter().flat_map(|(_, e)| e).map(|e| e.amount).sum(),
    })
}
