use serde::Deserialize;

use super::{Course, CourseStatus};

/// Filters and ordering accepted by the public course listing.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    pub language: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
    /// Substring of the instructor's name.
    pub instructor: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub published: Option<bool>,
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl CourseQuery {
    /// Whether the course passes every filter. `instructor_name` is the name of the course owner,
    /// if known.
    pub fn matches(&self, course: &Course, instructor_name: Option<&str>) -> bool {
        let published = self.published.unwrap_or(true);
        if (course.effective_status() == CourseStatus::Active) != published {
            return false;
        }

        let exact = |filter: &Option<String>, value: &str| filter.as_deref().map_or(true, |f| f == value);
        if !exact(&self.language, &course.language)
            || !exact(&self.category, &course.category)
            || !exact(&self.level, &course.level)
        {
            return false;
        }

        if self.min_price.map_or(false, |min| course.price < min) || self.max_price.map_or(false, |max| course.price > max)
        {
            return false;
        }

        if let Some(search) = &self.search {
            if !contains_ignore_case(&course.title, search) && !contains_ignore_case(&course.description, search) {
                return false;
            }
        }

        match &self.instructor {
            Some(instructor) => instructor_name.map_or(false, |name| contains_ignore_case(name, instructor)),
            None => true,
        }
    }

    /// Orders the courses and applies the limit. Newest first unless `sortBy` names another key.
    pub fn arrange<T>(&self, items: &mut Vec<T>, course: impl Fn(&T) -> &Course) {
        match self.sort_by.as_deref() {
            Some("price") => items.sort_by(|a, b| course(a).price.total_cmp(&course(b).price)),
            Some("rating") => items.sort_by(|a, b| course(b).rating.total_cmp(&course(a).rating)),
            Some("enrollmentCount") => items.sort_by(|a, b| course(b).enrollment_count.cmp(&course(a).enrollment_count)),
            _ => items.sort_by(|a, b| course(b).created_at.cmp(&course(a).created_at)),
        }

        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
    }
}
