use thiserror::Error;

use super::{Course, CourseStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot change course status from {from} to {to}.")]
    NotAllowed { from: CourseStatus, to: CourseStatus },

    #[error("Cannot activate course: Video is required.")]
    MissingVideo,

    #[error("Cannot activate course: Thumbnail is required.")]
    MissingThumbnail,

    #[error("Cannot archive course: Students are currently enrolled. Close the course first.")]
    HasEnrollments,
}

/// Whether the state machine has an edge from `from` to `to`, guards aside.
pub fn is_allowed(from: CourseStatus, to: CourseStatus) -> bool {
    use CourseStatus::*;

    matches!(
        (from, to),
        (Draft, Active) | (Active, Closed) | (Closed, Active) | (_, Archived) | (Archived, Active) | (Archived, Closed)
    )
}

/// Checks that `course` may move to `to`.
///
/// Every transition into `active` requires both assets, so an archived course whose assets were
/// removed cannot reach `active` through `closed` either.
pub fn check_transition(course: &Course, to: CourseStatus) -> Result<(), TransitionError> {
    let from = course.effective_status();
    if !is_allowed(from, to) {
        return Err(TransitionError::NotAllowed { from, to });
    }

    match to {
        CourseStatus::Active if !course.has_video() => Err(TransitionError::MissingVideo),
        CourseStatus::Active if !course.has_thumbnail() => Err(TransitionError::MissingThumbnail),
        CourseStatus::Archived if course.enrollment_count > 0 => Err(TransitionError::HasEnrollments),
        _ => Ok(()),
    }
}

/// Legacy published flag written along with `status`, `None` when it keeps its value.
pub fn published_flag(status: CourseStatus) -> Option<bool> {
    match status {
        CourseStatus::Active => Some(true),
        CourseStatus::Draft => Some(false),
        CourseStatus::Closed | CourseStatus::Archived => None,
    }
}

pub fn apply_transition(course: &mut Course, to: CourseStatus) {
    course.status = Some(to);
    if let Some(published) = published_flag(to) {
        course.is_published = published;
    }
}
