use async_trait::async_trait;
use uuid::Uuid;

use super::{Course, CourseStatus, Review};
use crate::repository::RepositoryError;

/// Editable course details. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub language: Option<String>,
    pub duration: Option<u32>,
    pub video_url: Option<String>,
    pub thumbnail: Option<String>,
}

impl CourseChanges {
    pub fn is_empty(&self) -> bool {
        *self == CourseChanges::default()
    }

    pub fn apply(&self, course: &mut Course) {
        fn assign<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        assign(&mut course.title, &self.title);
        assign(&mut course.description, &self.description);
        assign(&mut course.price, &self.price);
        assign(&mut course.category, &self.category);
        assign(&mut course.level, &self.level);
        assign(&mut course.language, &self.language);
        assign(&mut course.duration, &self.duration);
        assign(&mut course.video_url, &self.video_url);
        assign(&mut course.thumbnail, &self.thumbnail);
    }
}

#[async_trait]
pub trait CoursesRepository: Send + Sync {
    async fn create_course(&self, course: &Course) -> Result<(), RepositoryError>;

    async fn get_course(&self, course_id: &Uuid) -> Result<Course, RepositoryError>;

    async fn list_courses(&self) -> Result<Vec<Course>, RepositoryError>;

    async fn list_courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>, RepositoryError>;

    async fn update_details(&self, course_id: &Uuid, changes: &CourseChanges) -> Result<Course, RepositoryError>;

    /// Writes `status` (and the legacy published flag) only if the stored status still equals
    /// `expected`, `None` standing for a record without status. Archiving additionally requires the
    /// stored enrollment count to be zero. Fails with `RepositoryError::ConditionFailed` otherwise.
    async fn update_status(
        &self,
        course_id: &Uuid,
        expected: Option<CourseStatus>,
        status: CourseStatus,
    ) -> Result<Course, RepositoryError>;

    /// Atomically adds one to the enrollment count and returns the new count.
    async fn increment_enrollment_count(&self, course_id: &Uuid) -> Result<u64, RepositoryError>;

    /// Appends the review and stores the recomputed rating, provided the stored review count still
    /// equals `expected_review_count`.
    async fn add_review(
        &self,
        course_id: &Uuid,
        review: &Review,
        rating: f64,
        expected_review_count: u32,
    ) -> Result<Course, RepositoryError>;

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), RepositoryError>;
}
