use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::{storage_failure, Caller};
use crate::course::CourseStatus;
use crate::enrollment::{Enrollment, EnrollmentView, PaymentStatus};
use crate::repository::RepositoryError;
use crate::Context;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnrollOutput {
    pub message: String,
    pub enrollment: EnrollmentView,
    pub enrollment_count: u64,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("Only students can enroll in courses")]
    NotAuthorized,

    #[error("Course not found")]
    NotFound,

    #[error("This course is not available for enrollment")]
    NotAvailable,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,
}

impl OperationError for EnrollError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotAvailable => StatusCode::BAD_REQUEST,
            Self::AlreadyEnrolled => StatusCode::CONFLICT,
        }
    }
}

/// Enrolls the caller once payment was confirmed.
///
/// The enrollment insert and the counter increment are two separate writes. The insert is the one
/// that decides between concurrent attempts; if the increment then fails the enrollment stands and
/// the counter stays one behind.
#[tracing::instrument(skip(ctx), fields(user_id = %caller.user_id))]
pub async fn enroll(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
) -> Result<EnrollOutput, EndpointError<EnrollError>> {
    if !caller.is_student() {
        return Err(EndpointError::operation(EnrollError::NotAuthorized));
    }

    let course = ctx.courses.get_course(course_id).await.map_err(|e| match e {
        RepositoryError::NotFound => EndpointError::operation(EnrollError::NotFound),
        e => storage_failure("Loading course", e),
    })?;
    if matches!(course.effective_status(), CourseStatus::Draft | CourseStatus::Archived) {
        return Err(EndpointError::operation(EnrollError::NotAvailable));
    }

    let existing = ctx
        .enrollments
        .get_enrollment(&caller.user_id, course_id)
        .await
        .map_err(|e| storage_failure("Loading enrollment", e))?;
    if existing.is_some() {
        return Err(EndpointError::operation(EnrollError::AlreadyEnrolled));
    }

    let enrollment = Enrollment::builder()
        .user_id(caller.user_id)
        .course_id(*course_id)
        .payment_status(PaymentStatus::Completed)
        .amount(course.price)
        .build();
    ctx.enrollments
        .create_enrollment(&enrollment)
        .await
        .map_err(|e| match e {
            RepositoryError::Duplicate => EndpointError::operation(EnrollError::AlreadyEnrolled),
            e => storage_failure("Creating enrollment", e),
        })?;

    let enrollment_count = match ctx.courses.increment_enrollment_count(course_id).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(error = ?e, course_id = %course_id, "Enrollment stored but the enrollment count was not incremented.");
            course.enrollment_count
        }
    };
    tracing::info!(course_id = %course_id, enrollment_count, "Enrolled student.");

    Ok(EnrollOutput {
        message: "Successfully enrolled in course".to_string(),
        enrollment: EnrollmentView::from(&enrollment),
        enrollment_count,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::testing::TestContext;
    use crate::user_account::Role;

    #[tokio::test]
    async fn enrolling_records_payment_and_counts() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;

        let output = enroll(&test.ctx, &TestContext::caller(&student), &course.course_id)
            .await
            .unwrap();

        assert_eq!(output.enrollment.payment_status, PaymentStatus::Completed);
        assert_eq!(output.enrollment.amount, course.price);
        assert_eq!(output.enrollment.currency, "usd");
        assert_eq!(output.enrollment_count, 1);
    }

    #[tokio::test]
    async fn second_enrollment_conflicts_and_keeps_count() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;
        let caller = TestContext::caller(&student);

        enroll(&test.ctx, &caller, &course.course_id).await.unwrap();
        let err = enroll(&test.ctx, &caller, &course.course_id).await.unwrap_err();

        assert!(matches!(err, EndpointError::Operation(EnrollError::AlreadyEnrolled)));
        let stored = test.ctx.courses.get_course(&course.course_id).await.unwrap();
        assert_eq!(stored.enrollment_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attempts_enroll_once() {
        let test = Arc::new(TestContext::new());
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let test = test.clone();
                let caller = TestContext::caller(&student);
                let course_id = course.course_id;
                tokio::spawn(async move { enroll(&test.ctx, &caller, &course_id).await.is_ok() })
            })
            .collect();
        let mut successes = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let stored = test.ctx.courses.get_course(&course.course_id).await.unwrap();
        assert_eq!(stored.enrollment_count, 1);
        assert_eq!(
            test.ctx.enrollments.list_enrollments_by_course(&course.course_id).await.unwrap().len(),
            1
        );
    }

    #[rstest]
    #[case(CourseStatus::Draft)]
    #[case(CourseStatus::Archived)]
    #[tokio::test]
    async fn unavailable_courses_refuse_enrollment(#[case] status: CourseStatus) {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, status, true).await;

        let err = enroll(&test.ctx, &TestContext::caller(&student), &course.course_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Operation(EnrollError::NotAvailable)));
    }

    #[tokio::test]
    async fn closed_course_still_accepts_enrollment() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Closed, true).await;

        assert!(enroll(&test.ctx, &TestContext::caller(&student), &course.course_id).await.is_ok());
    }

    #[tokio::test]
    async fn legacy_unpublished_course_is_unavailable() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_legacy_course(&instructor, false).await;

        let err = enroll(&test.ctx, &TestContext::caller(&student), &course.course_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Operation(EnrollError::NotAvailable)));
    }

    #[tokio::test]
    async fn instructors_cannot_enroll() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;

        let err = enroll(&test.ctx, &TestContext::caller(&instructor), &course.course_id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::FORBIDDEN);
    }
}
