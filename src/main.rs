use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod academics;
mod access;
mod attendance;
mod config;
mod db;
mod error;
mod fees;
mod format;
mod grades;
mod import;
mod models;
mod report;
mod store;

use access::{require_role, RequestContext, STAFF};
use models::{AttendanceStatus, NewAssignment, NewResult};
use store::AcademicStore;

#[derive(Parser)]
#[command(name = "portal-metrics")]
#[command(
    about = "Academic metrics for the university portal: attendance, results, fees",
    long_about = None
)]
struct Cli {
    /// Id of the user making the request
    #[arg(long, global = true)]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Attendance summary by subject, month and overall
    Attendance,
    /// Mark one student's attendance for a subject and date (faculty/admin)
    MarkAttendance {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        subject_code: String,
        #[arg(long)]
        subject_name: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        status: AttendanceStatus,
    },
    /// Import attendance marks from a CSV file (faculty/admin)
    ImportAttendance {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Results with SGPA and CGPA
    Results {
        #[arg(long)]
        semester: Option<i32>,
    },
    /// Record a graded result for a student (faculty/admin)
    AddResult {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        subject_code: String,
        #[arg(long)]
        subject_name: String,
        #[arg(long)]
        semester: i32,
        #[arg(long)]
        internal: i32,
        #[arg(long)]
        external: i32,
        #[arg(long)]
        grade: String,
        #[arg(long)]
        credits: i32,
    },
    /// Fee listing with totals
    Fees,
    /// Settle one of your fees in full
    PayFee {
        #[arg(long)]
        fee: Uuid,
    },
    /// Assignments ordered by deadline
    Assignments,
    /// Create an assignment for a student (faculty/admin)
    CreateAssignment {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        subject_code: String,
        #[arg(long)]
        deadline: NaiveDate,
    },
    /// Submit one of your assignments
    SubmitAssignment {
        #[arg(long)]
        assignment: Uuid,
        #[arg(long)]
        file: Option<String>,
    },
    /// Grade a submitted assignment (faculty/admin)
    GradeAssignment {
        #[arg(long)]
        assignment: Uuid,
        #[arg(long)]
        grade: String,
    },
    /// Generate a markdown academic report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted. Student id: {}", db::SEED_STUDENT_ID);
        }
        command => {
            let user_id = cli
                .user
                .context("--user is required for this command")?;
            let store = db::PgStore::new(pool);

            match handle(&store, user_id, command).await {
                Ok(body) => print_json(&body)?,
                Err(err) => {
                    if err.is_internal() {
                        tracing::error!(error = %err, "request failed");
                    }
                    print_json(&ErrorBody {
                        error: err.public_message(),
                        status: err.status_code(),
                    })?;
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Resolves the caller, applies role gates, then runs the engine operation
/// and shapes its response.
async fn handle(
    store: &dyn AcademicStore,
    user_id: Uuid,
    command: Commands,
) -> error::Result<serde_json::Value> {
    let user = academics::resolve_user(store, user_id).await?;
    let ctx = RequestContext::from(&user);

    let body = match command {
        Commands::InitDb | Commands::Seed => serde_json::Value::Null,
        Commands::Attendance => {
            serde_json::to_value(academics::attendance_summary(store, ctx.user_id).await?)?
        }
        Commands::MarkAttendance {
            student,
            subject_code,
            subject_name,
            date,
            status,
        } => {
            require_role(&ctx, STAFF)?;
            let ack = academics::mark_attendance(
                store,
                student,
                &subject_code,
                &subject_name,
                date,
                status,
            )
            .await?;
            serde_json::to_value(ack)?
        }
        Commands::ImportAttendance { csv } => {
            require_role(&ctx, STAFF)?;
            let records = import::read_attendance_csv(&csv)
                .map_err(|e| error::Error::InvalidInput(format!("{e:#}")))?;
            let applied = academics::import_attendance(store, &records).await?;
            json!({ "success": true, "applied": applied })
        }
        Commands::Results { semester } => {
            serde_json::to_value(academics::academic_standing(store, ctx.user_id, semester).await?)?
        }
        Commands::AddResult {
            student,
            subject_code,
            subject_name,
            semester,
            internal,
            external,
            grade,
            credits,
        } => {
            require_role(&ctx, STAFF)?;
            let ack = academics::record_result(
                store,
                NewResult {
                    user_id: student,
                    subject_code,
                    subject_name,
                    semester,
                    internal,
                    external,
                    grade,
                    credits,
                },
            )
            .await?;
            serde_json::to_value(ack)?
        }
        Commands::Fees => serde_json::to_value(academics::fee_overview(store, ctx.user_id).await?)?,
        Commands::PayFee { fee } => {
            serde_json::to_value(academics::pay_fee(store, ctx.user_id, fee).await?)?
        }
        Commands::Assignments => {
            serde_json::to_value(academics::assignments(store, ctx.user_id).await?)?
        }
        Commands::CreateAssignment {
            student,
            title,
            subject_code,
            deadline,
        } => {
            require_role(&ctx, STAFF)?;
            let ack = academics::create_assignment(
                store,
                NewAssignment {
                    user_id: student,
                    title,
                    subject_code,
                    deadline,
                },
            )
            .await?;
            serde_json::to_value(ack)?
        }
        Commands::SubmitAssignment { assignment, file } => {
            let ack =
                academics::submit_assignment(store, ctx.user_id, assignment, file.as_deref())
                    .await?;
            serde_json::to_value(ack)?
        }
        Commands::GradeAssignment { assignment, grade } => {
            require_role(&ctx, STAFF)?;
            serde_json::to_value(academics::grade_assignment(store, assignment, &grade).await?)?
        }
        Commands::Report { out } => {
            let attendance = academics::attendance_summary(store, ctx.user_id).await?;
            let standing = academics::academic_standing(store, ctx.user_id, None).await?;
            let fees = academics::fee_overview(store, ctx.user_id).await?;
            let assignments = academics::assignments(store, ctx.user_id).await?;
            let report = report::build_report(
                &user,
                Utc::now().date_naive(),
                &attendance,
                &standing,
                &fees,
                &assignments,
            );
            std::fs::write(&out, report)?;
            json!({ "success": true, "message": format!("Report written to {}", out.display()) })
        }
    };

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::store::memory::MemoryStore;

    fn user(store: &MemoryStore, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        store.add_user(User {
            id,
            full_name: format!("{role} user"),
            email: format!("{id}@university.edu"),
            role,
        });
        id
    }

    fn mark(student: Uuid) -> Commands {
        Commands::MarkAttendance {
            student,
            subject_code: "CS301".to_string(),
            subject_name: "Data Structures & Algorithms".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 9).expect("valid date"),
            status: AttendanceStatus::Present,
        }
    }

    #[tokio::test]
    async fn students_cannot_mark_attendance() {
        let store = MemoryStore::default();
        let student = user(&store, Role::Student);

        let err = handle(&store, student, mark(student))
            .await
            .expect_err("forbidden");
        assert_eq!(err.status_code(), 403);
        assert_eq!(store.attendance_rows(), 0);
    }

    #[tokio::test]
    async fn faculty_can_mark_attendance() {
        let store = MemoryStore::default();
        let student = user(&store, Role::Student);
        let faculty = user(&store, Role::Faculty);

        let body = handle(&store, faculty, mark(student)).await.expect("marked");
        assert_eq!(body["success"], true);
        assert_eq!(store.attendance_rows(), 1);

        let summary = handle(&store, student, Commands::Attendance)
            .await
            .expect("summary");
        assert_eq!(summary["overall"]["totalClasses"], 1);
    }

    #[tokio::test]
    async fn unknown_caller_is_not_found() {
        let store = MemoryStore::default();
        let student = user(&store, Role::Student);

        let err = handle(&store, Uuid::new_v4(), mark(student))
            .await
            .expect_err("unknown caller");
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.attendance_rows(), 0);
    }

    #[tokio::test]
    async fn alumni_cannot_grade_assignments() {
        let store = MemoryStore::default();
        let alumnus = user(&store, Role::Alumni);

        let err = handle(
            &store,
            alumnus,
            Commands::GradeAssignment {
                assignment: Uuid::new_v4(),
                grade: "A".to_string(),
            },
        )
        .await
        .expect_err("forbidden");
        assert_eq!(err.status_code(), 403);
        assert!(err.public_message().contains("alumni"));
    }

    #[tokio::test]
    async fn zero_semester_lists_every_result() {
        let store = MemoryStore::default();
        let student = user(&store, Role::Student);

        let body = handle(&store, student, Commands::Results { semester: Some(0) })
            .await
            .expect("standing");
        assert_eq!(body["results"], serde_json::json!([]));
        assert_eq!(body["sgpa"], 0.0);
    }
}
