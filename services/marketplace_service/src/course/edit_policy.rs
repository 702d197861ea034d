use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

use super::{Course, CourseStatus};

/// What an instructor may change on a course, derived from its status and enrollments.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, AsRefStr)]
#[serde(rename_all = "lowercase")]
pub enum EditPolicy {
    /// Every field, assets included.
    Full,
    /// Assets are frozen.
    Restricted,
    /// Asset edits are accepted but affect enrolled students.
    Partial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CourseAsset {
    Video,
    Thumbnail,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetEditError {
    #[error("The course {0} cannot be changed while students are enrolled in the active course.")]
    Frozen(CourseAsset),

    #[error("The course {0} cannot be removed while the course is {1}.")]
    Required(CourseAsset, CourseStatus),
}

pub fn edit_policy(course: &Course) -> EditPolicy {
    match (course.effective_status(), course.enrollment_count > 0) {
        (CourseStatus::Active, true) => EditPolicy::Restricted,
        (CourseStatus::Closed, true) => EditPolicy::Partial,
        _ => EditPolicy::Full,
    }
}

/// Checks a change of the given asset reference to `new_value`. Returns a warning for the caller
/// when the change is accepted but reaches enrolled students.
pub fn check_asset_edit(course: &Course, asset: CourseAsset, new_value: &str) -> Result<Option<String>, AssetEditError> {
    let status = course.effective_status();
    if new_value.trim().is_empty() && matches!(status, CourseStatus::Active | CourseStatus::Closed) {
        return Err(AssetEditError::Required(asset, status));
    }

    match edit_policy(course) {
        EditPolicy::Restricted => Err(AssetEditError::Frozen(asset)),
        EditPolicy::Partial => Ok(Some(format!(
            "This course has {} enrolled student(s); the new {} replaces the one they were watching.",
            course.enrollment_count, asset
        ))),
        EditPolicy::Full => Ok(None),
    }
}
