pub mod ddb_repository;
pub mod edit_policy;
pub mod lifecycle;
pub mod query;
pub mod repository;
pub mod types;

pub use edit_policy::{CourseAsset, EditPolicy};
pub use lifecycle::TransitionError;
pub use query::CourseQuery;
pub use repository::{CourseChanges, CoursesRepository};
pub use types::{Course, CourseStatus, Review};
