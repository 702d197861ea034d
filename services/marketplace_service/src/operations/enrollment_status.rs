use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use super::{storage_failure, Caller};
use crate::enrollment::EnrollmentView;
use crate::Context;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatusOutput {
    pub is_enrolled: bool,
    pub enrollment: Option<EnrollmentView>,
}

pub async fn enrollment_status(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
) -> Result<EnrollmentStatusOutput, EndpointError<Infallible>> {
    let enrollment = ctx
        .enrollments
        .get_enrollment(&caller.user_id, course_id)
        .await
        .map_err(|e| storage_failure("Loading enrollment", e))?;

    Ok(EnrollmentStatusOutput {
        is_enrolled: enrollment.is_some(),
        enrollment: enrollment.as_ref().map(EnrollmentView::from),
    })
}
