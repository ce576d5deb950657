use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::serialize_rupees;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
    Alumni,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
            Role::Alumni => "alumni",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            "alumni" => Ok(Role::Alumni),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            other => Err(format!("unknown attendance status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Pending,
    Paid,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Pending => "pending",
            FeeStatus::Paid => "paid",
        }
    }
}

impl FromStr for FeeStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(FeeStatus::Pending),
            "paid" => Ok(FeeStatus::Paid),
            other => Err(format!("unknown fee status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Submitted,
    Graded,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Submitted => "submitted",
            AssignmentStatus::Graded => "graded",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AssignmentStatus::Pending),
            "submitted" => Ok(AssignmentStatus::Submitted),
            "graded" => Ok(AssignmentStatus::Graded),
            other => Err(format!("unknown assignment status '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    pub user_id: Uuid,
    pub subject_code: String,
    pub subject_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject_code: String,
    pub subject_name: String,
    pub semester: i32,
    pub internal: i32,
    pub external: i32,
    pub grade: String,
    pub credits: i32,
}

/// Amounts are held in paise so sums and differences stay exact.
#[derive(Debug, Clone)]
pub struct FeeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub amount: i64,
    pub paid: i64,
    pub status: FeeStatus,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AssignmentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub subject_code: String,
    pub deadline: NaiveDate,
    pub status: AssignmentStatus,
    pub grade: Option<String>,
    pub file_path: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewResult {
    pub user_id: Uuid,
    pub subject_code: String,
    pub subject_name: String,
    pub semester: i32,
    pub internal: i32,
    pub external: i32,
    pub grade: String,
    pub credits: i32,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub user_id: Uuid,
    pub title: String,
    pub subject_code: String,
    pub deadline: NaiveDate,
}

// Derived views returned to callers.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAttendance {
    pub code: String,
    pub subject: String,
    pub present: i64,
    pub absent: i64,
    pub total: i64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAttendance {
    pub month: String,
    #[serde(skip)]
    pub key: String,
    #[serde(skip)]
    pub present: i64,
    #[serde(skip)]
    pub absent: i64,
    #[serde(skip)]
    pub total: i64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAttendance {
    pub total_classes: i64,
    pub present: i64,
    pub absent: i64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub subjects: Vec<SubjectAttendance>,
    pub monthly: Vec<MonthlyAttendance>,
    pub overall: OverallAttendance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub code: String,
    pub subject: String,
    pub semester: i32,
    pub internal: i32,
    pub external: i32,
    pub total: i32,
    pub grade: String,
    pub credits: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicStanding {
    pub results: Vec<ResultRow>,
    pub sgpa: f64,
    pub cgpa: f64,
    pub total_credits: i64,
    pub semesters: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRow {
    pub id: Uuid,
    pub description: String,
    #[serde(serialize_with = "serialize_rupees")]
    pub amount: i64,
    #[serde(serialize_with = "serialize_rupees")]
    pub paid: i64,
    pub status: FeeStatus,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSummary {
    #[serde(serialize_with = "serialize_rupees")]
    pub total: i64,
    #[serde(serialize_with = "serialize_rupees")]
    pub paid: i64,
    #[serde(serialize_with = "serialize_rupees")]
    pub pending: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeOverview {
    pub fees: Vec<FeeRow>,
    pub summary: FeeSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub deadline: NaiveDate,
    pub status: AssignmentStatus,
    pub submitted: bool,
    pub grade: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            id: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn created(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::ok()
        }
    }
}
