use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{unknown_user, Error, Result};
use crate::models::{
    AssignmentRecord, AssignmentStatus, AttendanceRecord, AttendanceStatus, FeeRecord, FeeStatus,
    ResultRecord, Role, User,
};
use crate::store::AcademicStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed store. Owns a handle to the pool built at startup.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    row.try_get::<String, _>(column)?
        .parse()
        .map_err(Error::CorruptRow)
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        role: parse_column(row, "role")?,
    })
}

fn attendance_from_row(row: &PgRow) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        user_id: row.try_get("user_id")?,
        subject_code: row.try_get("subject_code")?,
        subject_name: row.try_get("subject_name")?,
        date: row.try_get("date")?,
        status: parse_column(row, "status")?,
    })
}

fn result_from_row(row: &PgRow) -> Result<ResultRecord> {
    Ok(ResultRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        subject_code: row.try_get("subject_code")?,
        subject_name: row.try_get("subject_name")?,
        semester: row.try_get("semester")?,
        internal: row.try_get("internal")?,
        external: row.try_get("external")?,
        grade: row.try_get("grade")?,
        credits: row.try_get("credits")?,
    })
}

fn fee_from_row(row: &PgRow) -> Result<FeeRecord> {
    Ok(FeeRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        description: row.try_get("description")?,
        amount: row.try_get("amount_paise")?,
        paid: row.try_get("paid_paise")?,
        status: parse_column(row, "status")?,
        due_date: row.try_get("due_date")?,
        paid_at: row.try_get("paid_at")?,
    })
}

fn assignment_from_row(row: &PgRow) -> Result<AssignmentRecord> {
    Ok(AssignmentRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        subject_code: row.try_get("subject_code")?,
        deadline: row.try_get("deadline")?,
        status: parse_column(row, "status")?,
        grade: row.try_get("grade")?,
        file_path: row.try_get("file_path")?,
        submitted_at: row.try_get("submitted_at")?,
    })
}

fn conflict_or_storage(err: sqlx::Error, conflict: impl FnOnce() -> String) -> Error {
    let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        Error::Conflict(conflict())
    } else {
        Error::Storage(err)
    }
}

async fn upsert_attendance_on(conn: &mut PgConnection, record: &AttendanceRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO portal.attendance (user_id, subject_code, subject_name, date, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, subject_code, date) DO UPDATE
        SET status = EXCLUDED.status
        "#,
    )
    .bind(record.user_id)
    .bind(&record.subject_code)
    .bind(&record.subject_name)
    .bind(record.date)
    .bind(record.status.as_str())
    .execute(conn)
    .await
    .map_err(|err| {
        let orphan = matches!(&err, sqlx::Error::Database(db) if db.is_foreign_key_violation());
        if orphan {
            unknown_user(record.user_id)
        } else {
            Error::Storage(err)
        }
    })?;
    Ok(())
}

#[async_trait]
impl AcademicStore for PgStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, full_name, email, role FROM portal.users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn attendance_for_user(&self, user_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            "SELECT user_id, subject_code, subject_name, date, status \
             FROM portal.attendance WHERE user_id = $1 \
             ORDER BY subject_code, date",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(attendance_from_row).collect()
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_attendance_on(&mut conn, record).await
    }

    async fn upsert_attendance_batch(&self, records: &[AttendanceRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_attendance_on(&mut tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn results_for_user(&self, user_id: Uuid) -> Result<Vec<ResultRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, subject_code, subject_name, semester, internal, external, \
             grade, credits FROM portal.results WHERE user_id = $1 \
             ORDER BY semester DESC, subject_code",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(result_from_row).collect()
    }

    async fn insert_result(&self, record: &ResultRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO portal.results
            (id, user_id, subject_code, subject_name, semester, internal, external, grade, credits)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.subject_code)
        .bind(&record.subject_name)
        .bind(record.semester)
        .bind(record.internal)
        .bind(record.external)
        .bind(&record.grade)
        .bind(record.credits)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            conflict_or_storage(err, || {
                format!(
                    "result for {} in semester {} already recorded",
                    record.subject_code, record.semester
                )
            })
        })?;
        Ok(())
    }

    async fn fees_for_user(&self, user_id: Uuid) -> Result<Vec<FeeRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, description, amount_paise, paid_paise, status, due_date, paid_at \
             FROM portal.fees WHERE user_id = $1 \
             ORDER BY due_date ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(fee_from_row).collect()
    }

    async fn find_fee(&self, user_id: Uuid, fee_id: Uuid) -> Result<Option<FeeRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, description, amount_paise, paid_paise, status, due_date, paid_at \
             FROM portal.fees WHERE id = $1 AND user_id = $2",
        )
        .bind(fee_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(fee_from_row).transpose()
    }

    async fn settle_fee(&self, fee_id: Uuid, paid_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE portal.fees SET paid_paise = amount_paise, status = $2, paid_at = $3 \
             WHERE id = $1",
        )
        .bind(fee_id)
        .bind(FeeStatus::Paid.as_str())
        .bind(paid_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assignments_for_user(&self, user_id: Uuid) -> Result<Vec<AssignmentRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, subject_code, deadline, status, grade, file_path, \
             submitted_at FROM portal.assignments WHERE user_id = $1 \
             ORDER BY deadline ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(assignment_from_row).collect()
    }

    async fn insert_assignment(&self, record: &AssignmentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO portal.assignments
            (id, user_id, title, subject_code, deadline, status, grade, file_path, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.subject_code)
        .bind(record.deadline)
        .bind(record.status.as_str())
        .bind(&record.grade)
        .bind(&record.file_path)
        .bind(record.submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn submit_assignment(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        file_path: Option<&str>,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE portal.assignments \
             SET status = 'submitted', file_path = $3, submitted_at = $4 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(assignment_id)
        .bind(user_id)
        .bind(file_path)
        .bind(submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn grade_assignment(&self, assignment_id: Uuid, grade: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE portal.assignments SET status = 'graded', grade = $2 WHERE id = $1",
        )
        .bind(assignment_id)
        .bind(grade)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub const SEED_STUDENT_ID: &str = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2";

const SEED_SUBJECTS: [(&str, &str); 5] = [
    ("CS301", "Data Structures & Algorithms"),
    ("CS302", "Operating Systems"),
    ("CS303", "Database Management"),
    ("CS304", "Computer Networks"),
    ("CS305", "Software Engineering"),
];

/// Weekday class dates on alternate days from September 2025 through February 2026.
fn seed_class_dates() -> anyhow::Result<Vec<NaiveDate>> {
    let start = NaiveDate::from_ymd_opt(2025, 9, 1).context("invalid date")?;
    let end = NaiveDate::from_ymd_opt(2026, 2, 28).context("invalid date")?;
    let mut dates = Vec::new();
    let mut day = start;

    while day <= end {
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        if !weekend && day.day() % 2 == 1 && day.day() <= 28 {
            dates.push(day);
        }
        day += Duration::days(1);
    }

    Ok(dates)
}

/// One mark per seed subject and class date, with a scattering of absences.
fn seed_attendance(student_id: Uuid, dates: &[NaiveDate]) -> Vec<AttendanceRecord> {
    let mut records = Vec::with_capacity(SEED_SUBJECTS.len() * dates.len());
    for (index, (code, name)) in SEED_SUBJECTS.iter().enumerate() {
        for (offset, date) in dates.iter().enumerate() {
            let status = if (offset + index * 3) % 8 == 0 {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            records.push(AttendanceRecord {
                user_id: student_id,
                subject_code: code.to_string(),
                subject_name: name.to_string(),
                date: *date,
                status,
            });
        }
    }
    records
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let student_id = Uuid::parse_str(SEED_STUDENT_ID)?;
    let users = vec![
        (student_id, "Rahul Kumar", "rahul@university.edu", Role::Student, "Computer Science"),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Dr. Priya Sharma",
            "priya@university.edu",
            Role::Faculty,
            "Computer Science",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Admin User",
            "admin@university.edu",
            Role::Admin,
            "Administration",
        ),
        (
            Uuid::parse_str("8b1e6c55-3f0a-4c2e-9d7b-5a4f3e2d1c0b")?,
            "Ankit Verma",
            "ankit@alumni.edu",
            Role::Alumni,
            "Computer Science",
        ),
    ];

    for (id, name, email, role, department) in users {
        sqlx::query(
            r#"
            INSERT INTO portal.users (id, full_name, email, role, department)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, role = EXCLUDED.role,
                department = EXCLUDED.department
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role.as_str())
        .bind(department)
        .execute(pool)
        .await?;
    }

    let mut attendance_rows = 0u64;
    for record in seed_attendance(student_id, &seed_class_dates()?) {
        attendance_rows += sqlx::query(
            r#"
            INSERT INTO portal.attendance (user_id, subject_code, subject_name, date, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, subject_code, date) DO NOTHING
            "#,
        )
        .bind(record.user_id)
        .bind(&record.subject_code)
        .bind(&record.subject_name)
        .bind(record.date)
        .bind(record.status.as_str())
        .execute(pool)
        .await?
        .rows_affected();
    }

    let results = vec![
        ("CS201", "Object Oriented Programming", 4, 34, 52, "A", 4),
        ("CS202", "Discrete Mathematics", 4, 30, 45, "B+", 3),
        ("CS203", "Digital Logic", 4, 28, 40, "B", 3),
        ("CS301", "Data Structures & Algorithms", 5, 38, 58, "A", 4),
        ("CS302", "Operating Systems", 5, 35, 55, "A", 4),
        ("CS303", "Database Management", 5, 40, 60, "A+", 4),
        ("CS304", "Computer Networks", 5, 30, 50, "B+", 3),
        ("CS305", "Software Engineering", 5, 36, 58, "A", 3),
    ];

    for (code, name, semester, internal, external, grade, credits) in results {
        sqlx::query(
            r#"
            INSERT INTO portal.results
            (id, user_id, subject_code, subject_name, semester, internal, external, grade, credits)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, subject_code, semester) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(code)
        .bind(name)
        .bind(semester)
        .bind(internal)
        .bind(external)
        .bind(grade)
        .bind(credits)
        .execute(pool)
        .await?;
    }

    let assignments = vec![
        ("DSA Assignment 5 - Trees", "CS301", (2026, 3, 5), AssignmentStatus::Pending, None),
        (
            "OS Lab Report - Process Scheduling",
            "CS302",
            (2026, 3, 2),
            AssignmentStatus::Submitted,
            None,
        ),
        ("DBMS Project - ER Diagram", "CS303", (2026, 2, 28), AssignmentStatus::Graded, Some("A")),
        ("CN Assignment 3 - TCP/IP", "CS304", (2026, 3, 10), AssignmentStatus::Pending, None),
    ];

    for (title, code, (y, m, d), status, grade) in assignments {
        let deadline = NaiveDate::from_ymd_opt(y, m, d).context("invalid date")?;
        sqlx::query(
            r#"
            INSERT INTO portal.assignments
            (id, user_id, title, subject_code, deadline, status, grade)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM portal.assignments WHERE user_id = $2 AND title = $3
            )
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(title)
        .bind(code)
        .bind(deadline)
        .bind(status.as_str())
        .bind(grade)
        .execute(pool)
        .await?;
    }

    let paid_at = NaiveDate::from_ymd_opt(2026, 1, 10)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .context("invalid timestamp")?
        .and_utc();
    let fees = vec![
        ("Sem 6 Tuition Fee", 8_500_000i64, true, (2026, 1, 15)),
        ("Sem 6 Hostel Fee", 4_500_000, true, (2026, 1, 15)),
        ("Sem 6 Lab Fee", 800_000, false, (2026, 3, 15)),
        ("Exam Fee", 300_000, false, (2026, 3, 20)),
    ];

    for (description, amount, settled, (y, m, d)) in fees {
        let due_date = NaiveDate::from_ymd_opt(y, m, d).context("invalid date")?;
        let status = if settled {
            FeeStatus::Paid
        } else {
            FeeStatus::Pending
        };
        sqlx::query(
            r#"
            INSERT INTO portal.fees
            (id, user_id, description, amount_paise, paid_paise, status, due_date, paid_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (
                SELECT 1 FROM portal.fees WHERE user_id = $2 AND description = $3
            )
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(description)
        .bind(amount)
        .bind(if settled { amount } else { 0 })
        .bind(status.as_str())
        .bind(due_date)
        .bind(settled.then_some(paid_at))
        .execute(pool)
        .await?;
    }

    info!(attendance_rows, "seed data written");
    Ok(())
}
