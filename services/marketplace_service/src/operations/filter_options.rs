use std::collections::BTreeSet;
use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;

use super::storage_failure;
use crate::Context;

const DEFAULT_CATEGORIES: &[&str] = &[
    "Programming & Development",
    "Web Development",
    "Mobile Development",
    "Data Science & Analytics",
    "Artificial Intelligence & Machine Learning",
    "Cybersecurity",
    "Cloud Computing",
    "Database Management",
    "Software Engineering",
    "UI/UX Design",
    "Graphic Design",
    "Digital Marketing",
    "Business & Entrepreneurship",
    "Project Management",
    "Finance & Accounting",
    "Language Learning",
    "Music & Audio",
    "Photography & Video",
    "Health & Fitness",
    "Cooking & Culinary Arts",
    "Art & Creativity",
    "Education & Teaching",
    "Personal Development",
    "Technology",
    "Science",
    "Mathematics",
    "History",
    "Literature",
    "Philosophy",
    "Religion & Spirituality",
    "Travel & Tourism",
    "Sports & Recreation",
    "Fashion & Beauty",
    "Automotive",
    "Home & Garden",
    "Parenting & Family",
    "Career Development",
    "Public Speaking",
    "Writing & Communication",
    "Research & Academic",
    "Environmental Science",
    "Medical & Healthcare",
    "Law & Legal Studies",
    "Agriculture",
    "Architecture",
    "Engineering",
    "Other",
];

const DEFAULT_LANGUAGES: &[&str] = &["English", "Tigrigna", "Amharic"];

const DEFAULT_LEVELS: &[&str] = &["Beginner", "Intermediate", "Advanced", "Expert", "All Levels"];

#[derive(Serialize, Debug, PartialEq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub languages: Vec<String>,
    pub levels: Vec<String>,
}

fn merge<'a>(defaults: &[&'a str], stored: impl Iterator<Item = &'a str>) -> Vec<String> {
    defaults
        .iter()
        .copied()
        .chain(stored)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Values the catalogue can be filtered by: the defaults plus whatever stored courses use.
pub async fn filter_options(ctx: &Context) -> Result<FilterOptions, EndpointError<Infallible>> {
    let courses = ctx
        .courses
        .list_courses()
        .await
        .map_err(|e| storage_failure("Listing courses", e))?;

    Ok(FilterOptions {
        categories: merge(DEFAULT_CATEGORIES, courses.iter().map(|c| c.category.as_str())),
        languages: merge(DEFAULT_LANGUAGES, courses.iter().map(|c| c.language.as_str())),
        levels: merge(DEFAULT_LEVELS, courses.iter().map(|c| c.level.as_str())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseStatus;
    use crate::testing::TestContext;
    use crate::user_account::Role;

    #[test]
    fn merge_deduplicates_and_sorts() {
        let merged = merge(&["Beta", "Alpha"], ["Alpha", " Gamma ", ""].into_iter());
        assert_eq!(merged, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn stored_values_join_defaults() {
        let test = TestContext::new();
        let instructor = test.add_user("Selam", Role::Instructor).await;
        let course = test.add_course(&instructor, CourseStatus::Draft, false).await;

        let options = filter_options(&test.ctx).await.unwrap();

        assert!(options.categories.contains(&course.category));
        assert!(options.categories.contains(&"Cybersecurity".to_string()));
        assert!(options.languages.contains(&course.language));
        assert!(options.levels.contains(&"All Levels".to_string()));
        assert!(options.levels.contains(&course.level));
        assert!(options.languages.windows(2).all(|w| w[0] < w[1]));
    }
}
