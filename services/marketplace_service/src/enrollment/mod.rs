pub mod ddb_repository;
pub mod repository;
pub mod types;

pub use repository::EnrollmentsRepository;
pub use types::{Enrollment, EnrollmentView, PaymentStatus};
