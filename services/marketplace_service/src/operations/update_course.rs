use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::create_course::{check_asset_reference, check_language, check_level, check_price};
use super::views::CourseView;
use super::{lenient, storage_failure, Caller};
use crate::course::edit_policy::{check_asset_edit, AssetEditError};
use crate::course::{CourseAsset, CourseChanges};
use crate::repository::RepositoryError;
use crate::Context;

/// Course details an owner may change. Status, enrollments and reviews have their own operations.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UpdateCourseOutput {
    pub message: String,
    pub course: CourseView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UpdateCourseError {
    #[error("Course not found")]
    NotFound,

    #[error("Not authorized to update this course")]
    NotAuthorized,

    #[error(transparent)]
    AssetLocked(#[from] AssetEditError),
}

impl OperationError for UpdateCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::AssetLocked(_) => StatusCode::CONFLICT,
        }
    }
}

fn validate(input: &UpdateCourseInput) -> Result<(), String> {
    if input.title.as_deref().map_or(false, |t| t.trim().is_empty()) {
        return Err("Title cannot be empty".to_string());
    }
    if input.description.as_deref().map_or(false, |d| d.trim().is_empty()) {
        return Err("Description cannot be empty".to_string());
    }
    if let Some(price) = input.price {
        check_price(price)?;
    }
    if let Some(language) = &input.language {
        check_language(language)?;
    }
    if let Some(level) = &input.level {
        check_level(level)?;
    }

    Ok(())
}

#[tracing::instrument(skip(ctx, input), fields(user_id = %caller.user_id))]
pub async fn update_course(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
    input: UpdateCourseInput,
) -> Result<UpdateCourseOutput, EndpointError<UpdateCourseError>> {
    let not_found = |e: RepositoryError| match e {
        RepositoryError::NotFound => EndpointError::operation(UpdateCourseError::NotFound),
        e => storage_failure("Updating course", e),
    };

    let course = ctx.courses.get_course(course_id).await.map_err(not_found)?;
    if !course.is_owned_by(&caller.user_id) {
        return Err(EndpointError::operation(UpdateCourseError::NotAuthorized));
    }
    validate(&input).map_err(|m| EndpointError::validation(m))?;

    let mut warnings = Vec::new();
    let mut video_url = None;
    let mut thumbnail = None;
    let assets = [
        (CourseAsset::Video, input.video_url, &course.video_url, &mut video_url),
        (CourseAsset::Thumbnail, input.thumbnail, &course.thumbnail, &mut thumbnail),
    ];
    for (asset, requested, current, accepted) in assets {
        let Some(requested) = requested else { continue };
        let requested = requested.trim().to_string();
        if requested != *current {
            check_asset_reference(course_id, asset, &requested).map_err(|m| EndpointError::validation(m))?;
            let warning = check_asset_edit(&course, asset, &requested)
                .map_err(|e| EndpointError::operation(UpdateCourseError::from(e)))?;
            warnings.extend(warning);
        }
        *accepted = Some(requested);
    }

    let changes = CourseChanges {
        title: input.title.map(|t| t.trim().to_string()),
        description: input.description,
        price: input.price,
        category: input.category,
        level: input.level,
        language: input.language,
        duration: input.duration,
        video_url,
        thumbnail,
    };
    let course = if changes.is_empty() {
        course
    } else {
        ctx.courses.update_details(course_id, &changes).await.map_err(not_found)?
    };

    Ok(UpdateCourseOutput {
        message: "Course updated successfully".to_string(),
        course: CourseView::from(&course),
        warning: (!warnings.is_empty()).then(|| warnings.join(" ")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{CourseStatus, EditPolicy};
    use crate::media::AssetKind;
    use crate::operations::update_course_status::{update_course_status, UpdateCourseStatusInput};
    use crate::operations::upload_course_asset::upload_course_asset;
    use crate::testing::{staged_file, TestContext};
    use crate::user_account::Role;

    #[tokio::test]
    async fn owner_updates_details() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let course = test.add_course(&instructor, CourseStatus::Draft, false).await;
        let input = UpdateCourseInput {
            title: Some("Rust in depth".to_string()),
            price: Some(15.0),
            ..Default::default()
        };

        let output = update_course(&test.ctx, &TestContext::caller(&instructor), &course.course_id, input)
            .await
            .unwrap();

        assert_eq!(output.course.title, "Rust in depth");
        assert_eq!(output.course.price, 15.0);
        assert_eq!(output.course.status, CourseStatus::Draft);
        assert_eq!(output.warning, None);
    }

    #[tokio::test]
    async fn other_instructors_are_rejected() {
        let test = TestContext::new();
        let owner = test.add_user("Selam", Role::Instructor).await;
        let other = test.add_user("Dawit", Role::Instructor).await;
        let course = test.add_course(&owner, CourseStatus::Draft, false).await;

        let err = update_course(
            &test.ctx,
            &TestContext::caller(&other),
            &course.course_id,
            UpdateCourseInput::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn assets_follow_edit_policy() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let student = test.add_user("Dawit", Role::Student).await;
        let caller = TestContext::caller(&instructor);
        let course = test.add_course(&instructor, CourseStatus::Active, true).await;
        test.add_enrollment(&student, &course).await;
        let new_reference = format!("/uploads/video-{}-1700000000000-new.mp4", course.course_id);
        let new_video = || UpdateCourseInput {
            video_url: Some(new_reference.clone()),
            ..Default::default()
        };

        let err = update_course(&test.ctx, &caller, &course.course_id, new_video())
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::CONFLICT);

        let unchanged = UpdateCourseInput {
            video_url: Some(course.video_url.clone()),
            description: Some("Now with exercises".to_string()),
            ..Default::default()
        };
        update_course(&test.ctx, &caller, &course.course_id, unchanged).await.unwrap();

        test.ctx
            .courses
            .update_status(&course.course_id, Some(CourseStatus::Active), CourseStatus::Closed)
            .await
            .unwrap();
        let output = update_course(&test.ctx, &caller, &course.course_id, new_video())
            .await
            .unwrap();
        assert!(output.warning.is_some());
        assert_eq!(output.course.video_url, new_reference);
        let stored = test.ctx.courses.get_course(&course.course_id).await.unwrap();
        assert_eq!(crate::course::edit_policy::edit_policy(&stored), EditPolicy::Partial);
    }

    #[tokio::test]
    async fn media_of_other_courses_cannot_be_linked() {
        let test = TestContext::new();
        let owner = test.add_user("Selam", Role::Instructor).await;
        let other = test.add_user("Dawit", Role::Instructor).await;
        let theirs = test.add_course(&owner, CourseStatus::Draft, false).await;
        let mine = test.add_course(&other, CourseStatus::Draft, false).await;
        let caller = TestContext::caller(&other);

        let video = staged_file(&test.ctx, AssetKind::Video, "intro.mp4").await;
        let stored = upload_course_asset(&test.ctx, &TestContext::caller(&owner), &theirs.course_id, CourseAsset::Video, video)
            .await
            .unwrap();
        let borrowed = UpdateCourseInput {
            video_url: Some(stored.course.video_url.clone()),
            ..Default::default()
        };

        let err = update_course(&test.ctx, &caller, &mine.course_id, borrowed).await.unwrap_err();
        assert_eq!(err.code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "The video must be a file uploaded for this course");

        let outside = UpdateCourseInput {
            thumbnail: Some("https://media.s3.us-east-1.amazonaws.com/users/someone.png".to_string()),
            ..Default::default()
        };
        let err = update_course(&test.ctx, &caller, &mine.course_id, outside).await.unwrap_err();
        assert_eq!(err.code(), StatusCode::BAD_REQUEST);
        assert_eq!(test.ctx.courses.get_course(&mine.course_id).await.unwrap().video_url, "");
    }

    #[tokio::test]
    async fn blank_asset_reference_clears_it() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let caller = TestContext::caller(&instructor);
        let course = test.add_course(&instructor, CourseStatus::Draft, true).await;
        let blank = UpdateCourseInput {
            video_url: Some("   ".to_string()),
            ..Default::default()
        };

        let output = update_course(&test.ctx, &caller, &course.course_id, blank).await.unwrap();
        assert_eq!(output.course.video_url, "");

        let err = update_course_status(&test.ctx, &caller, &course.course_id, &UpdateCourseStatusInput { status: "active".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::CONFLICT);
    }
}
