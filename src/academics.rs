//! Engine operations: fetch a user's rows through the store, then hand them to
//! the pure calculators. Role checks happen in the request layer before any of
//! these run.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    AcademicStanding, Ack, AssignmentRecord, AssignmentRow, AssignmentStatus, AttendanceRecord,
    AttendanceStatus, AttendanceSummary, FeeOverview, NewAssignment, NewResult, ResultRecord, User,
};
use crate::store::AcademicStore;
use crate::{attendance, fees, grades};

pub async fn resolve_user(store: &dyn AcademicStore, user_id: Uuid) -> Result<User> {
    store.find_user(user_id).await?.ok_or(Error::NotFound {
        entity: "User",
        id: user_id,
    })
}

pub async fn attendance_summary(
    store: &dyn AcademicStore,
    user_id: Uuid,
) -> Result<AttendanceSummary> {
    let records = store.attendance_for_user(user_id).await?;
    debug!(%user_id, rows = records.len(), "summarizing attendance");
    Ok(attendance::summarize(&records))
}

pub async fn mark_attendance(
    store: &dyn AcademicStore,
    user_id: Uuid,
    subject_code: &str,
    subject_name: &str,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<Ack> {
    let record = AttendanceRecord {
        user_id,
        subject_code: subject_code.to_string(),
        subject_name: subject_name.to_string(),
        date,
        status,
    };
    store.upsert_attendance(&record).await?;
    info!(%user_id, subject_code, %date, status = status.as_str(), "attendance marked");
    Ok(Ack::ok())
}

/// Applies every record as an upsert, or none of them if any fails, and
/// returns how many were written.
pub async fn import_attendance(
    store: &dyn AcademicStore,
    records: &[AttendanceRecord],
) -> Result<usize> {
    store.upsert_attendance_batch(records).await?;
    info!(rows = records.len(), "attendance imported");
    Ok(records.len())
}

pub async fn academic_standing(
    store: &dyn AcademicStore,
    user_id: Uuid,
    semester: Option<i32>,
) -> Result<AcademicStanding> {
    // Semester numbers start at 1, so zero or less means "all semesters".
    let semester = semester.filter(|s| *s > 0);
    let results = store.results_for_user(user_id).await?;
    debug!(%user_id, rows = results.len(), ?semester, "computing academic standing");
    Ok(grades::standing(&results, semester))
}

impl NewResult {
    fn validate(&self) -> Result<()> {
        if self.subject_code.trim().is_empty() {
            return Err(Error::InvalidInput("subject code is required".into()));
        }
        if self.semester <= 0 {
            return Err(Error::InvalidInput("semester must be positive".into()));
        }
        if self.credits <= 0 {
            return Err(Error::InvalidInput("credits must be positive".into()));
        }
        if !(0..=40).contains(&self.internal) {
            return Err(Error::InvalidInput("internal marks must be within 0-40".into()));
        }
        if !(0..=60).contains(&self.external) {
            return Err(Error::InvalidInput("external marks must be within 0-60".into()));
        }
        if self.grade.trim().is_empty() {
            return Err(Error::InvalidInput("grade is required".into()));
        }
        Ok(())
    }
}

pub async fn record_result(store: &dyn AcademicStore, input: NewResult) -> Result<Ack> {
    input.validate()?;
    let record = ResultRecord {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        subject_code: input.subject_code,
        subject_name: input.subject_name,
        semester: input.semester,
        internal: input.internal,
        external: input.external,
        grade: input.grade,
        credits: input.credits,
    };
    store.insert_result(&record).await?;
    info!(
        user_id = %record.user_id,
        subject = %record.subject_code,
        semester = record.semester,
        "result recorded"
    );
    Ok(Ack::created(record.id))
}

pub async fn fee_overview(store: &dyn AcademicStore, user_id: Uuid) -> Result<FeeOverview> {
    let rows = store.fees_for_user(user_id).await?;
    Ok(fees::overview(&rows))
}

/// Settles a fee in full. Paying an already-paid fee re-applies the same
/// update and succeeds again.
pub async fn pay_fee(store: &dyn AcademicStore, user_id: Uuid, fee_id: Uuid) -> Result<Ack> {
    let fee = store
        .find_fee(user_id, fee_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Fee",
            id: fee_id,
        })?;

    store.settle_fee(fee.id, Utc::now()).await?;
    info!(%user_id, %fee_id, amount = fee.amount, "fee settled");
    Ok(Ack::with_message(fees::payment_message(fee.amount)))
}

pub async fn assignments(store: &dyn AcademicStore, user_id: Uuid) -> Result<Vec<AssignmentRow>> {
    let mut rows = store.assignments_for_user(user_id).await?;
    rows.sort_by_key(|a| a.deadline);

    Ok(rows
        .into_iter()
        .map(|a| AssignmentRow {
            id: a.id,
            title: a.title,
            subject: a.subject_code,
            deadline: a.deadline,
            status: a.status,
            submitted: a.status != AssignmentStatus::Pending,
            grade: a.grade,
            file_path: a.file_path,
        })
        .collect())
}

pub async fn create_assignment(store: &dyn AcademicStore, input: NewAssignment) -> Result<Ack> {
    if input.title.trim().is_empty() {
        return Err(Error::InvalidInput("title is required".into()));
    }
    let record = AssignmentRecord {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        title: input.title,
        subject_code: input.subject_code,
        deadline: input.deadline,
        status: AssignmentStatus::Pending,
        grade: None,
        file_path: None,
        submitted_at: None,
    };
    store.insert_assignment(&record).await?;
    info!(user_id = %record.user_id, assignment_id = %record.id, "assignment created");
    Ok(Ack::created(record.id))
}

pub async fn submit_assignment(
    store: &dyn AcademicStore,
    user_id: Uuid,
    assignment_id: Uuid,
    file_path: Option<&str>,
) -> Result<Ack> {
    if !store
        .submit_assignment(user_id, assignment_id, file_path, Utc::now())
        .await?
    {
        return Err(Error::NotFound {
            entity: "Assignment",
            id: assignment_id,
        });
    }
    info!(%user_id, %assignment_id, "assignment submitted");
    Ok(Ack::ok())
}

pub async fn grade_assignment(
    store: &dyn AcademicStore,
    assignment_id: Uuid,
    grade: &str,
) -> Result<Ack> {
    if grade.trim().is_empty() {
        return Err(Error::InvalidInput("grade is required".into()));
    }
    if !store.grade_assignment(assignment_id, grade).await? {
        return Err(Error::NotFound {
            entity: "Assignment",
            id: assignment_id,
        });
    }
    info!(%assignment_id, grade, "assignment graded");
    Ok(Ack::ok())
}
