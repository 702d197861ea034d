use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Grant of access to one course for one user. The pair (`user_id`, `course_id`) is the table key.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, TypedBuilder)]
#[serde(rename_all = "PascalCase")]
pub struct Enrollment {
    pub user_id: Uuid,

    pub course_id: Uuid,

    #[builder(default = Utc::now())]
    pub enrolled_at: DateTime<Utc>,

    #[serde(default)]
    #[builder(default)]
    pub payment_status: PaymentStatus,

    pub amount: f64,

    #[serde(default = "default_currency")]
    #[builder(default = default_currency(), setter(into))]
    pub currency: String,

    /// Percentage watched, 0 to 100.
    #[serde(default)]
    #[builder(default)]
    pub progress: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub last_watched_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "usd".to_string()
}

impl Enrollment {
    pub fn grants_access(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }
}

/// Enrollment as returned to callers.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    pub progress: u8,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentView {
    fn from(e: &Enrollment) -> Self {
        EnrollmentView {
            user_id: e.user_id,
            course_id: e.course_id,
            enrolled_at: e.enrolled_at,
            payment_status: e.payment_status,
            amount: e.amount,
            currency: e.currency.clone(),
            progress: e.progress,
            last_watched_at: e.last_watched_at,
            completed_at: e.completed_at,
        }
    }
}
