use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use super::{storage_failure, Caller};
use crate::enrollment::EnrollmentView;
use crate::repository::RepositoryError;
use crate::Context;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaidCourse {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub thumbnail: String,
}

#[derive(Serialize, Debug)]
pub struct Payment {
    #[serde(flatten)]
    pub enrollment: EnrollmentView,
    pub course: Option<PaidCourse>,
}

/// The caller's enrollments as payments, most recent first.
pub async fn payment_history(ctx: &Context, caller: &Caller) -> Result<Vec<Payment>, EndpointError<Infallible>> {
    let mut enrollments = ctx
        .enrollments
        .list_enrollments_by_user(&caller.user_id)
        .await
        .map_err(|e| storage_failure("Listing enrollments", e))?;
    enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));

    let mut payments = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        let course = match ctx.courses.get_course(&enrollment.course_id).await {
            Ok(course) => Some(PaidCourse {
                id: course.course_id,
                title: course.title,
                price: course.price,
                thumbnail: course.thumbnail,
            }),
            Err(RepositoryError::NotFound) => None,
            Err(e) => return Err(storage_failure("Loading course", e)),
        };
        payments.push(Payment {
            enrollment: EnrollmentView::from(enrollment),
            course,
        });
    }

    Ok(payments)
}
