use std::collections::HashSet;
use std::convert::Infallible;

use service_core::endpoint_error::EndpointError;

use super::views::CourseView;
use super::{storage_failure, users_by_id, Caller};
use crate::course::CourseQuery;
use crate::Context;

/// Public course catalogue. When a caller is known, every course says whether they are enrolled.
#[tracing::instrument(skip_all)]
pub async fn list_courses(
    ctx: &Context,
    caller: Option<&Caller>,
    query: &CourseQuery,
) -> Result<Vec<CourseView>, EndpointError<Infallible>> {
    let courses = ctx
        .courses
        .list_courses()
        .await
        .map_err(|e| storage_failure("Listing courses", e))?;
    let instructors = users_by_id(ctx, courses.iter().map(|c| c.instructor_id))
        .await
        .map_err(|e| storage_failure("Loading instructors", e))?;

    let mut matching: Vec<_> = courses
        .into_iter()
        .filter(|c| {
            let name = instructors.get(&c.instructor_id).map(|u| u.name.as_str());
            query.matches(c, name)
        })
        .collect();
    query.arrange(&mut matching, |c| c);

    let enrolled: Option<HashSet<_>> = match caller {
        Some(caller) => Some(
            ctx.enrollments
                .list_enrollments_by_user(&caller.user_id)
                .await
                .map_err(|e| storage_failure("Listing enrollments", e))?
                .into_iter()
                .map(|e| e.course_id)
                .collect(),
        ),
        None => None,
    };

    Ok(matching
        .iter()
        .map(|course| {
            let view = CourseView::from(course).with_instructor(instructors.get(&course.instructor_id));
            match &enrolled {
                Some(ids) => view.with_enrolled(ids.contains(&course.course_id)),
                None => view,
            }
        })
        .collect())
}
