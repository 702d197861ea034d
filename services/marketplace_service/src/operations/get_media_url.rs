use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::{storage_failure, Caller};
use crate::course::{Course, CourseAsset};
use crate::media::MediaType;
use crate::repository::RepositoryError;
use crate::user_account::UserLookup;
use crate::Context;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaRequest {
    CourseVideo(Uuid),
    CourseThumbnail(Uuid),
    /// Thumbnail shown in the public catalogue; no caller needed.
    PublicThumbnail(Uuid),
    ProfileImage(Uuid),
}

/// Why the caller was let through.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Instructor,
    Enrolled,
    Public,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaUrlOutput {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessType>,
}

#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GetMediaUrlError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("You must be enrolled in this course to access the {0}")]
    Forbidden(CourseAsset),

    #[error("No {0} available for this course")]
    AssetNotFound(CourseAsset),

    #[error("No profile image found")]
    ProfileImageNotFound,
}

impl OperationError for GetMediaUrlError {
    fn code(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::CourseNotFound | Self::UserNotFound | Self::AssetNotFound(_) | Self::ProfileImageNotFound => {
                StatusCode::NOT_FOUND
            }
        }
    }
}

fn asset_reference(course: &Course, asset: CourseAsset) -> &str {
    match asset {
        CourseAsset::Video => &course.video_url,
        CourseAsset::Thumbnail => &course.thumbnail,
    }
}

/// Hands out a URL for a stored asset.
///
/// Checks run in a fixed order: the record must exist, the caller must be allowed, the asset must be
/// present, and only then is the reference resolved. Object store references become signed URLs
/// that expire after an hour; local files get their direct URL.
#[tracing::instrument(skip(ctx, caller))]
pub async fn get_media_url(
    ctx: &Context,
    caller: Option<&Caller>,
    request: MediaRequest,
) -> Result<MediaUrlOutput, EndpointError<GetMediaUrlError>> {
    let (reference, access_type) = match request {
        MediaRequest::ProfileImage(user_id) => {
            if caller.is_none() {
                return Err(EndpointError::Unauthenticated);
            }
            let user = ctx.users.get_user(&UserLookup::ById(user_id)).await.map_err(|e| match e {
                RepositoryError::NotFound => EndpointError::operation(GetMediaUrlError::UserNotFound),
                e => storage_failure("Loading user", e),
            })?;
            if user.profile_picture.is_empty() {
                return Err(EndpointError::operation(GetMediaUrlError::ProfileImageNotFound));
            }
            (user.profile_picture, None)
        }
        MediaRequest::CourseVideo(course_id)
        | MediaRequest::CourseThumbnail(course_id)
        | MediaRequest::PublicThumbnail(course_id) => {
            let asset = match request {
                MediaRequest::CourseVideo(_) => CourseAsset::Video,
                _ => CourseAsset::Thumbnail,
            };
            let course = ctx.courses.get_course(&course_id).await.map_err(|e| match e {
                RepositoryError::NotFound => EndpointError::operation(GetMediaUrlError::CourseNotFound),
                e => storage_failure("Loading course", e),
            })?;

            let access_type = match (request, caller) {
                (MediaRequest::PublicThumbnail(_), _) => AccessType::Public,
                (_, None) => return Err(EndpointError::Unauthenticated),
                (_, Some(caller)) => course_access(ctx, &course, caller, asset).await?,
            };

            let reference = asset_reference(&course, asset);
            if reference.is_empty() {
                return Err(EndpointError::operation(GetMediaUrlError::AssetNotFound(asset)));
            }
            (reference.to_string(), Some(access_type))
        }
    };

    let resolved = ctx
        .media
        .resolve(&reference)
        .await
        .map_err(|e| storage_failure("Resolving media reference", e))?;

    Ok(MediaUrlOutput {
        url: resolved.url,
        media_type: resolved.media_type,
        expires_in: resolved.expires_in,
        access_type,
    })
}

async fn course_access(
    ctx: &Context,
    course: &Course,
    caller: &Caller,
    asset: CourseAsset,
) -> Result<AccessType, EndpointError<GetMediaUrlError>> {
    if course.is_owned_by(&caller.user_id) {
        return Ok(AccessType::Instructor);
    }

    let enrollment = ctx
        .enrollments
        .get_enrollment(&caller.user_id, &course.course_id)
        .await
        .map_err(|e| storage_failure("Loading enrollment", e))?;
    match enrollment {
        Some(enrollment) if enrollment.grants_access() => Ok(AccessType::Enrolled),
        _ => Err(EndpointError::operation(GetMediaUrlError::Forbidden(asset))),
    }
}
