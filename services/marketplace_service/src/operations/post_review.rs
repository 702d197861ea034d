use actix_web::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::views::CourseView;
use super::{storage_failure, validation_message, Caller};
use crate::course::types::average_rating;
use crate::course::Review;
use crate::repository::RepositoryError;
use crate::Context;

const MAX_ATTEMPTS: usize = 3;

#[derive(Deserialize, Validate, Debug)]
pub struct PostReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,

    #[validate(length(min = 1, message = "Review text is required"))]
    pub text: String,
}

#[derive(Serialize, Debug)]
pub struct PostReviewOutput {
    pub message: String,
    pub course: CourseView,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PostReviewError {
    #[error("Course not found")]
    NotFound,

    #[error("You must be enrolled in this course to review it")]
    NotEnrolled,

    #[error("You have already reviewed this course")]
    AlreadyReviewed,

    #[error("The course is receiving many reviews right now. Please try again.")]
    Contended,
}

impl OperationError for PostReviewError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotEnrolled => StatusCode::FORBIDDEN,
            Self::AlreadyReviewed | Self::Contended => StatusCode::CONFLICT,
        }
    }
}

/// Adds the caller's review and stores the recomputed rating with it. The write is conditional on
/// the review count read beforehand, and is retried on a fresh read when another review got in
/// first.
#[tracing::instrument(skip(ctx, input), fields(user_id = %caller.user_id))]
pub async fn post_review(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
    mut input: PostReviewInput,
) -> Result<PostReviewOutput, EndpointError<PostReviewError>> {
    input.text = input.text.trim().to_string();
    input
        .validate()
        .map_err(|e| EndpointError::validation(validation_message(&e)))?;

    let load = |e: RepositoryError| match e {
        RepositoryError::NotFound => EndpointError::operation(PostReviewError::NotFound),
        e => storage_failure("Loading course", e),
    };
    let mut course = ctx.courses.get_course(course_id).await.map_err(load)?;

    let enrollment = ctx
        .enrollments
        .get_enrollment(&caller.user_id, course_id)
        .await
        .map_err(|e| storage_failure("Loading enrollment", e))?;
    if enrollment.is_none() {
        return Err(EndpointError::operation(PostReviewError::NotEnrolled));
    }

    let review = Review {
        user_id: caller.user_id,
        rating: input.rating,
        text: input.text,
        created_at: Utc::now(),
    };

    for _ in 0..MAX_ATTEMPTS {
        if course.review_by(&caller.user_id).is_some() {
            return Err(EndpointError::operation(PostReviewError::AlreadyReviewed));
        }

        let mut reviews = course.reviews.clone();
        reviews.push(review.clone());
        let rating = average_rating(&reviews);

        match ctx
            .courses
            .add_review(course_id, &review, rating, course.review_count)
            .await
        {
            Ok(updated) => {
                return Ok(PostReviewOutput {
                    message: "Review added successfully".to_string(),
                    course: CourseView::from(&updated),
                })
            }
            Err(RepositoryError::ConditionFailed) => {
                tracing::debug!(course_id = %course_id, "Review count changed, retrying.");
                course = ctx.courses.get_course(course_id).await.map_err(load)?;
            }
            Err(e) => return Err(storage_failure("Adding review", e)),
        }
    }

    Err(EndpointError::operation(PostReviewError::Contended))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseStatus;
    use crate::testing::TestContext;
    use crate::user_account::Role;

    fn review(rating: u8, text: &str) -> PostReviewInput {
        PostReviewInput {
            rating,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn reviews_update_rating() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let first = test.add_user("Dawit", Role::Student).await;
        let second = test.add_user("Hana", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;
        test.add_enrollment(&first, &course).await;
        test.add_enrollment(&second, &course).await;

        post_review(&test.ctx, &TestContext::caller(&first), &course.course_id, review(5, "Great"))
            .await
            .unwrap();
        let output = post_review(&test.ctx, &TestContext::caller(&second), &course.course_id, review(4, " Good "))
            .await
            .unwrap();

        assert_eq!(output.course.review_count, 2);
        assert_eq!(output.course.rating, 4.5);
        assert_eq!(output.course.reviews[1].text, "Good");
    }

    #[tokio::test]
    async fn one_review_per_student() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;
        test.add_enrollment(&student, &course).await;
        let caller = TestContext::caller(&student);

        post_review(&test.ctx, &caller, &course.course_id, review(5, "Great")).await.unwrap();
        let err = post_review(&test.ctx, &caller, &course.course_id, review(1, "Changed my mind"))
            .await
            .unwrap_err();

        assert!(matches!(err, EndpointError::Operation(PostReviewError::AlreadyReviewed)));
    }

    #[tokio::test]
    async fn requires_enrollment_and_valid_input() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;
        let caller = TestContext::caller(&student);

        let err = post_review(&test.ctx, &caller, &course.course_id, review(5, "Great"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::FORBIDDEN);

        let err = post_review(&test.ctx, &caller, &course.course_id, review(6, "Great"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Rating must be between 1 and 5");

        let err = post_review(&test.ctx, &caller, &course.course_id, review(3, "   "))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Review text is required");
    }
}
