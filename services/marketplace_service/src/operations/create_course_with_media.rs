use actix_web::http::StatusCode;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use super::create_course::{draft_course, CreateCourseInput, CreateCourseOutput};
use super::views::CourseView;
use super::{storage_failure, Caller};
use crate::course::{Course, CourseChanges};
use crate::media::{MediaStoreError, StagedFile};
use crate::repository::RepositoryError;
use crate::Context;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CreateCourseWithMediaError {
    #[error("Access denied. Instructor role required.")]
    NotAuthorized,
}

impl OperationError for CreateCourseWithMediaError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotAuthorized => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, Error)]
enum MediaStepError {
    #[error(transparent)]
    Media(#[from] MediaStoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Creates the course record, then stores the uploaded files and records their references. When
/// any of the later steps fails, the course record and the files already stored are removed.
#[tracing::instrument(skip(ctx, input, video, thumbnail), fields(user_id = %caller.user_id))]
pub async fn create_course_with_media(
    ctx: &Context,
    caller: &Caller,
    input: CreateCourseInput,
    video: Option<StagedFile>,
    thumbnail: Option<StagedFile>,
) -> Result<CreateCourseOutput, EndpointError<CreateCourseWithMediaError>> {
    if !caller.is_instructor() {
        return Err(EndpointError::operation(CreateCourseWithMediaError::NotAuthorized));
    }

    let course = draft_course(caller.user_id, input).map_err(|m| EndpointError::validation(m))?;
    ctx.courses
        .create_course(&course)
        .await
        .map_err(|e| storage_failure("Creating course", e))?;

    let mut stored = Vec::new();
    let course = match attach_media(ctx, &course, video, thumbnail, &mut stored).await {
        Ok(course) => course,
        Err(err) => {
            tracing::error!(error = ?err, course_id = %course.course_id, "Storing course media failed, rolling back.");
            for reference in &stored {
                if let Err(e) = ctx.media.remove(reference).await {
                    tracing::warn!(error = ?e, reference = %reference, "Removing stored media failed.");
                }
            }
            if let Err(e) = ctx.courses.delete_course(&course.course_id).await {
                tracing::error!(error = ?e, course_id = %course.course_id, "Deleting course during rollback failed.");
            }
            return Err(EndpointError::internal());
        }
    };
    tracing::info!(course_id = %course.course_id, media = stored.len(), "Created course with media.");

    Ok(CreateCourseOutput {
        message: "Course created successfully".to_string(),
        course: CourseView::from(&course),
    })
}

async fn attach_media(
    ctx: &Context,
    course: &Course,
    video: Option<StagedFile>,
    thumbnail: Option<StagedFile>,
    stored: &mut Vec<String>,
) -> Result<Course, MediaStepError> {
    let mut changes = CourseChanges::default();
    if let Some(staged) = video {
        let reference = ctx.media.store(&course.course_id, staged).await?;
        stored.push(reference.clone());
        changes.video_url = Some(reference);
    }
    if let Some(staged) = thumbnail {
        let reference = ctx.media.store(&course.course_id, staged).await?;
        stored.push(reference.clone());
        changes.thumbnail = Some(reference);
    }

    if changes.is_empty() {
        return Ok(course.clone());
    }
    Ok(ctx.courses.update_details(&course.course_id, &changes).await?)
}
