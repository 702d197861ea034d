use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::views::CourseView;
use super::{storage_failure, Caller};
use crate::course::edit_policy::{check_asset_edit, AssetEditError};
use crate::course::{CourseAsset, CourseChanges};
use crate::media::{AssetKind, StagedFile};
use crate::repository::RepositoryError;
use crate::Context;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadCourseAssetOutput {
    pub message: String,
    pub course: CourseView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UploadCourseAssetError {
    #[error("Course not found")]
    NotFound,

    #[error("Not authorized to update this course")]
    NotAuthorized,

    #[error(transparent)]
    AssetLocked(#[from] AssetEditError),
}

impl OperationError for UploadCourseAssetError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::AssetLocked(_) => StatusCode::CONFLICT,
        }
    }
}

/// Replaces the course video or thumbnail with an uploaded file.
#[tracing::instrument(skip(ctx, staged), fields(user_id = %caller.user_id))]
pub async fn upload_course_asset(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
    asset: CourseAsset,
    staged: StagedFile,
) -> Result<UploadCourseAssetOutput, EndpointError<UploadCourseAssetError>> {
    let not_found = |e: RepositoryError| match e {
        RepositoryError::NotFound => EndpointError::operation(UploadCourseAssetError::NotFound),
        e => storage_failure("Updating course", e),
    };

    let course = ctx.courses.get_course(course_id).await.map_err(not_found)?;
    if !course.is_owned_by(&caller.user_id) {
        return Err(EndpointError::operation(UploadCourseAssetError::NotAuthorized));
    }
    let warning = check_asset_edit(&course, asset, staged.file_name())
        .map_err(|e| EndpointError::operation(UploadCourseAssetError::from(e)))?;

    let reference = ctx
        .media
        .store(course_id, staged)
        .await
        .map_err(|e| storage_failure("Storing course media", e))?;
    let (changes, previous) = match asset {
        CourseAsset::Video => (
            CourseChanges {
                video_url: Some(reference.clone()),
                ..Default::default()
            },
            course.video_url,
        ),
        CourseAsset::Thumbnail => (
            CourseChanges {
                thumbnail: Some(reference.clone()),
                ..Default::default()
            },
            course.thumbnail,
        ),
    };

    let updated = match ctx.courses.update_details(course_id, &changes).await {
        Ok(updated) => updated,
        Err(err) => {
            if let Err(e) = ctx.media.remove(&reference).await {
                tracing::warn!(error = ?e, reference = %reference, "Removing unused course media failed.");
            }
            return Err(not_found(err));
        }
    };

    // Only files stored for this course are removed; older records may point anywhere.
    if AssetKind::from(asset).issued_for(course_id, &previous) {
        if let Err(e) = ctx.media.remove(&previous).await {
            tracing::warn!(error = ?e, reference = %previous, "Removing replaced course media failed.");
        }
    }

    Ok(UploadCourseAssetOutput {
        message: format!("Course {} uploaded successfully", asset),
        course: CourseView::from(&updated),
        warning,
    })
}
