use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use typed_builder::TypedBuilder;
use uuid::Uuid;

pub const LANGUAGES: &[&str] = &[
    "en", "ti", "am", "english", "tigrigna", "amharic", "English", "Tigrigna", "Amharic", "Arabic", "French", "Spanish",
];

pub const LEVELS: &[&str] = &[
    "beginner",
    "intermediate",
    "advanced",
    "expert",
    "all levels",
    "Beginner",
    "Intermediate",
    "Advanced",
    "Expert",
    "All Levels",
];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Active,
    Closed,
    Archived,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    pub user_id: Uuid,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A course as stored in the courses table.
///
/// Records written before the lifecycle was introduced carry no `Status`; only `IsPublished`
/// tells whether they are live. Use [`Course::effective_status`] instead of reading `status`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, TypedBuilder)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    #[builder(default = Uuid::new_v4())]
    pub course_id: Uuid,

    #[builder(setter(into))]
    pub title: String,

    #[builder(setter(into))]
    pub description: String,

    #[builder(setter(into))]
    pub language: String,

    pub price: f64,

    pub instructor_id: Uuid,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub video_url: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub thumbnail: String,

    /// Length in minutes.
    #[serde(default)]
    #[builder(default)]
    pub duration: u32,

    #[serde(default = "default_category")]
    #[builder(default = default_category(), setter(into))]
    pub category: String,

    #[serde(default = "default_level")]
    #[builder(default = default_level(), setter(into))]
    pub level: String,

    #[serde(default)]
    #[builder(default)]
    pub is_published: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default = Some(CourseStatus::Draft))]
    pub status: Option<CourseStatus>,

    #[serde(default)]
    #[builder(default)]
    pub enrollment_count: u64,

    #[serde(default)]
    #[builder(default)]
    pub rating: f64,

    #[serde(default)]
    #[builder(default)]
    pub review_count: u32,

    #[serde(default)]
    #[builder(default)]
    pub reviews: Vec<Review>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,

    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_level() -> String {
    "beginner".to_string()
}

impl Course {
    pub fn effective_status(&self) -> CourseStatus {
        match self.status {
            Some(status) => status,
            None if self.is_published => CourseStatus::Active,
            None => CourseStatus::Draft,
        }
    }

    pub fn has_video(&self) -> bool {
        !self.video_url.trim().is_empty()
    }

    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail.trim().is_empty()
    }

    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        &self.instructor_id == user_id
    }

    pub fn review_by(&self, user_id: &Uuid) -> Option<&Review> {
        self.reviews.iter().find(|r| &r.user_id == user_id)
    }
}

/// Average of the review ratings, 0 without reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(total) / reviews.len() as f64
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aws_sdk_dynamodb::types::AttributeValue;
    use rstest::rstest;

    use super::*;

    fn legacy_doc(published: bool) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("CourseId".to_string(), AttributeValue::S(Uuid::nil().to_string())),
            ("Title".to_string(), AttributeValue::S("Intro to Geez".to_string())),
            ("Description".to_string(), AttributeValue::S("Script basics".to_string())),
            ("Language".to_string(), AttributeValue::S("Tigrigna".to_string())),
            ("Price".to_string(), AttributeValue::N("19.5".to_string())),
            ("InstructorId".to_string(), AttributeValue::S(Uuid::nil().to_string())),
            ("IsPublished".to_string(), AttributeValue::Bool(published)),
            ("CreatedAt".to_string(), AttributeValue::S("2023-05-01T08:00:00Z".to_string())),
            ("UpdatedAt".to_string(), AttributeValue::S("2023-05-01T08:00:00Z".to_string())),
        ])
    }

    #[rstest]
    #[case(true, CourseStatus::Active)]
    #[case(false, CourseStatus::Draft)]
    fn legacy_record_derives_status(#[case] published: bool, #[case] expected: CourseStatus) {
        let course: Course = serde_dynamo::from_item(legacy_doc(published)).unwrap();

        assert_eq!(course.status, None);
        assert_eq!(course.enrollment_count, 0);
        assert_eq!(course.category, "General");
        assert_eq!(course.effective_status(), expected);
    }

    #[test]
    fn stored_status_wins_over_legacy_flag() {
        let course = Course::builder()
            .title("Rust")
            .description("Ownership")
            .language("English")
            .price(10.0)
            .instructor_id(Uuid::new_v4())
            .is_published(true)
            .status(Some(CourseStatus::Closed))
            .build();

        assert_eq!(course.effective_status(), CourseStatus::Closed);
    }

    #[test]
    fn status_is_not_written_when_absent() {
        let mut course: Course = serde_dynamo::from_item(legacy_doc(true)).unwrap();
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&course).unwrap();
        assert!(!item.contains_key("Status"));

        course.status = Some(CourseStatus::Archived);
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&course).unwrap();
        assert_eq!(item["Status"], AttributeValue::S("archived".to_string()));
    }

    #[test]
    fn average_rating_of_reviews() {
        let review = |rating| Review {
            user_id: Uuid::new_v4(),
            rating,
            text: "ok".to_string(),
            created_at: Utc::now(),
        };

        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review(5), review(4)]), 4.5);
    }
}
