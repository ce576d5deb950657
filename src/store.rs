use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AssignmentRecord, AttendanceRecord, FeeRecord, ResultRecord, User};

/// Persistence seam for the academic engine. Implementations own their
/// connection resources; callers receive them explicitly at startup.
#[async_trait]
pub trait AcademicStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn attendance_for_user(&self, user_id: Uuid) -> Result<Vec<AttendanceRecord>>;

    /// Insert or overwrite the status keyed on `(user_id, subject_code, date)`.
    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()>;

    /// Upserts every record or none of them. A record for an unknown user
    /// fails the whole batch with `Error::InvalidInput`.
    async fn upsert_attendance_batch(&self, records: &[AttendanceRecord]) -> Result<()>;

    async fn results_for_user(&self, user_id: Uuid) -> Result<Vec<ResultRecord>>;

    /// Fails with `Error::Conflict` when the user already has a result for
    /// that subject and semester.
    async fn insert_result(&self, record: &ResultRecord) -> Result<()>;

    async fn fees_for_user(&self, user_id: Uuid) -> Result<Vec<FeeRecord>>;

    async fn find_fee(&self, user_id: Uuid, fee_id: Uuid) -> Result<Option<FeeRecord>>;

    /// Sets `paid = amount`, `status = paid` and `paid_at`.
    async fn settle_fee(&self, fee_id: Uuid, paid_at: DateTime<Utc>) -> Result<()>;

    async fn assignments_for_user(&self, user_id: Uuid) -> Result<Vec<AssignmentRecord>>;

    async fn insert_assignment(&self, record: &AssignmentRecord) -> Result<()>;

    /// Returns false when no assignment with that id belongs to the user.
    async fn submit_assignment(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        file_path: Option<&str>,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Returns false when the assignment does not exist.
    async fn grade_assignment(&self, assignment_id: Uuid, grade: &str) -> Result<bool>;
}
