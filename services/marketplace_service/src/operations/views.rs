use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::course::edit_policy::edit_policy;
use crate::course::{Course, CourseStatus, EditPolicy, Review};
use crate::user_account::UserAccount;

/// Public part of an account shown next to courses and enrollments.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub profile_picture: String,
}

impl From<&UserAccount> for UserSummary {
    fn from(account: &UserAccount) -> Self {
        UserSummary {
            id: account.user_id,
            name: account.name.clone(),
            email: account.email.clone(),
            profile_picture: account.profile_picture.clone(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub user_id: Uuid,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        ReviewView {
            user_id: review.user_id,
            rating: review.rating,
            text: review.text.clone(),
            created_at: review.created_at,
        }
    }
}

/// A course as returned to callers. `status` is always the effective status.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub language: String,
    pub price: f64,
    pub category: String,
    pub level: String,
    pub duration: u32,
    pub video_url: String,
    pub thumbnail: String,
    pub status: CourseStatus,
    pub is_published: bool,
    pub enrollment_count: u64,
    pub rating: f64,
    pub review_count: u32,
    pub reviews: Vec<ReviewView>,
    pub instructor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_policy: Option<EditPolicy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Course> for CourseView {
    fn from(course: &Course) -> Self {
        CourseView {
            id: course.course_id,
            title: course.title.clone(),
            description: course.description.clone(),
            language: course.language.clone(),
            price: course.price,
            category: course.category.clone(),
            level: course.level.clone(),
            duration: course.duration,
            video_url: course.video_url.clone(),
            thumbnail: course.thumbnail.clone(),
            status: course.effective_status(),
            is_published: course.is_published,
            enrollment_count: course.enrollment_count,
            rating: course.rating,
            review_count: course.review_count,
            reviews: course.reviews.iter().map(ReviewView::from).collect(),
            instructor_id: course.instructor_id,
            instructor: None,
            enrolled: None,
            edit_policy: None,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

impl CourseView {
    pub fn with_instructor(mut self, instructor: Option<&UserAccount>) -> Self {
        self.instructor = instructor.map(UserSummary::from);
        self
    }

    pub fn with_enrolled(mut self, enrolled: bool) -> Self {
        self.enrolled = Some(enrolled);
        self
    }

    pub fn with_edit_policy(mut self, course: &Course) -> Self {
        self.edit_policy = Some(edit_policy(course));
        self
    }
}
