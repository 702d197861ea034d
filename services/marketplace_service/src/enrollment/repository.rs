use async_trait::async_trait;
use uuid::Uuid;

use super::Enrollment;
use crate::repository::RepositoryError;

#[async_trait]
pub trait EnrollmentsRepository: Send + Sync {
    /// Inserts the enrollment. A second enrollment of the same user in the same course fails with
    /// `RepositoryError::Duplicate`, however close together the two requests arrive.
    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<(), RepositoryError>;

    async fn get_enrollment(&self, user_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>, RepositoryError>;

    async fn list_enrollments_by_user(&self, user_id: &Uuid) -> Result<Vec<Enrollment>, RepositoryError>;

    async fn list_enrollments_by_course(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, RepositoryError>;
}
