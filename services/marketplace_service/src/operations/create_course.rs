use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use uuid::Uuid;

use super::views::CourseView;
use super::{lenient, storage_failure, Caller};
use crate::course::types::{LANGUAGES, LEVELS};
use crate::course::{Course, CourseAsset};
use crate::media::AssetKind;
use crate::Context;

/// Course fields accepted on creation, as JSON or as multipart text fields.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
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
pub struct CreateCourseOutput {
    pub message: String,
    pub course: CourseView,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CreateCourseError {
    #[error("Access denied. Instructor role required.")]
    NotAuthorized,
}

impl OperationError for CreateCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotAuthorized => StatusCode::FORBIDDEN,
        }
    }
}

pub(crate) fn check_price(price: f64) -> Result<(), String> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err("Price must be a positive number".to_string())
    }
}

pub(crate) fn check_language(language: &str) -> Result<(), String> {
    if LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(format!("Language must be one of: {}", LANGUAGES.join(", ")))
    }
}

pub(crate) fn check_level(level: &str) -> Result<(), String> {
    if LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(format!("Level must be one of: {}", LEVELS.join(", ")))
    }
}

/// Normalises an asset reference sent by a client. Blank clears the asset; anything else must name
/// a file this service stored for the course.
pub(crate) fn check_asset_reference(course_id: &Uuid, asset: CourseAsset, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() || AssetKind::from(asset).issued_for(course_id, value) {
        Ok(value.to_string())
    } else {
        Err(format!("The {asset} must be a file uploaded for this course"))
    }
}

/// Validates the input and builds the draft course owned by `instructor_id`.
pub(crate) fn draft_course(instructor_id: Uuid, input: CreateCourseInput) -> Result<Course, String> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }
    if input.description.trim().is_empty() {
        return Err("Description is required".to_string());
    }
    let price = input.price.ok_or_else(|| "Price is required".to_string())?;
    check_price(price)?;
    let language = input
        .language
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| "Language is required".to_string())?;
    check_language(&language)?;

    let mut course = Course::builder()
        .title(title)
        .description(input.description)
        .language(language)
        .price(price)
        .instructor_id(instructor_id)
        .duration(input.duration.unwrap_or_default())
        .build();
    course.video_url = check_asset_reference(&course.course_id, CourseAsset::Video, &input.video_url.unwrap_or_default())?;
    course.thumbnail = check_asset_reference(&course.course_id, CourseAsset::Thumbnail, &input.thumbnail.unwrap_or_default())?;
    if let Some(category) = input.category.filter(|c| !c.trim().is_empty()) {
        course.category = category;
    }
    if let Some(level) = input.level.filter(|l| !l.trim().is_empty()) {
        check_level(&level)?;
        course.level = level;
    }

    Ok(course)
}

#[tracing::instrument(skip(ctx, input), fields(user_id = %caller.user_id))]
pub async fn create_course(
    ctx: &Context,
    caller: &Caller,
    input: CreateCourseInput,
) -> Result<CreateCourseOutput, EndpointError<CreateCourseError>> {
    if !caller.is_instructor() {
        return Err(EndpointError::operation(CreateCourseError::NotAuthorized));
    }

    let course = draft_course(caller.user_id, input).map_err(|m| EndpointError::validation(m))?;
    ctx.courses
        .create_course(&course)
        .await
        .map_err(|e| storage_failure("Creating course", e))?;
    tracing::info!(course_id = %course.course_id, "Created course.");

    Ok(CreateCourseOutput {
        message: "Course created successfully".to_string(),
        course: CourseView::from(&course),
    })
}
