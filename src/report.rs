use std::fmt::Write;

use chrono::NaiveDate;

use crate::format::format_rupees;
use crate::models::{
    AcademicStanding, AssignmentRow, AttendanceSummary, FeeOverview, FeeStatus, SubjectAttendance,
    User,
};

/// Minimum attendance a subject needs before it is flagged in the report.
pub const ATTENDANCE_THRESHOLD: f64 = 75.0;

pub fn attendance_shortfalls(summary: &AttendanceSummary) -> Vec<&SubjectAttendance> {
    let mut flagged: Vec<&SubjectAttendance> = summary
        .subjects
        .iter()
        .filter(|s| s.total > 0 && s.pct < ATTENDANCE_THRESHOLD)
        .collect();
    flagged.sort_by(|a, b| a.pct.partial_cmp(&b.pct).unwrap_or(std::cmp::Ordering::Equal));
    flagged
}

pub fn build_report(
    student: &User,
    generated_on: NaiveDate,
    attendance: &AttendanceSummary,
    standing: &AcademicStanding,
    fees: &FeeOverview,
    assignments: &[AssignmentRow],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        student.full_name, student.email, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");

    if attendance.subjects.is_empty() {
        let _ = writeln!(output, "No attendance recorded yet.");
    } else {
        let overall = &attendance.overall;
        let _ = writeln!(
            output,
            "Overall {:.1}% ({} of {} classes attended)",
            overall.average, overall.present, overall.total_classes
        );
        for subject in &attendance.subjects {
            let _ = writeln!(
                output,
                "- {} {}: {:.1}% ({}/{})",
                subject.code, subject.subject, subject.pct, subject.present, subject.total
            );
        }

        if !attendance.monthly.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "By month:");
            for month in &attendance.monthly {
                let _ = writeln!(
                    output,
                    "- {} ({}): {:.1}% ({} present, {} absent of {})",
                    month.month, month.key, month.pct, month.present, month.absent, month.total
                );
            }
        }

        let shortfalls = attendance_shortfalls(attendance);
        if !shortfalls.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "Below {ATTENDANCE_THRESHOLD:.0}%:");
            for subject in shortfalls {
                let _ = writeln!(output, "- {} at {:.1}%", subject.code, subject.pct);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Results");

    if standing.results.is_empty() {
        let _ = writeln!(output, "No results published yet.");
    } else {
        let _ = writeln!(
            output,
            "SGPA {:.1}, CGPA {:.1} across {} credits",
            standing.sgpa, standing.cgpa, standing.total_credits
        );
        for semester in &standing.semesters {
            let _ = writeln!(output, "### Semester {semester}");
            for row in standing.results.iter().filter(|r| r.semester == *semester) {
                let _ = writeln!(
                    output,
                    "- {} {}: {} ({} marks, {} credits)",
                    row.code, row.subject, row.grade, row.total, row.credits
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Fees");
    let _ = writeln!(
        output,
        "Total {}, paid {}, pending {}",
        format_rupees(fees.summary.total),
        format_rupees(fees.summary.paid),
        format_rupees(fees.summary.pending)
    );
    for fee in fees.fees.iter().filter(|f| f.status == FeeStatus::Pending) {
        let _ = writeln!(
            output,
            "- {} due {}: {}",
            fee.description,
            fee.due_date,
            format_rupees(fee.amount - fee.paid)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Open Assignments");

    let open: Vec<&AssignmentRow> = assignments.iter().filter(|a| !a.submitted).collect();
    if open.is_empty() {
        let _ = writeln!(output, "Nothing outstanding.");
    } else {
        for assignment in open {
            let _ = writeln!(
                output,
                "- {} ({}) due {}",
                assignment.title, assignment.subject, assignment.deadline
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AssignmentStatus, FeeRow, FeeSummary, MonthlyAttendance, OverallAttendance, ResultRow, Role,
    };
    use uuid::Uuid;

    fn student() -> User {
        User {
            id: Uuid::nil(),
            full_name: "Rahul Kumar".to_string(),
            email: "rahul@university.edu".to_string(),
            role: Role::Student,
        }
    }

    fn subject(code: &str, present: i64, total: i64, pct: f64) -> SubjectAttendance {
        SubjectAttendance {
            code: code.to_string(),
            subject: format!("{code} name"),
            present,
            absent: total - present,
            total,
            pct,
        }
    }

    fn empty_fees() -> FeeOverview {
        FeeOverview {
            fees: Vec::new(),
            summary: FeeSummary {
                total: 0,
                paid: 0,
                pending: 0,
            },
        }
    }

    fn empty_standing() -> AcademicStanding {
        AcademicStanding {
            results: Vec::new(),
            sgpa: 0.0,
            cgpa: 0.0,
            total_credits: 0,
            semesters: Vec::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn shortfalls_are_sorted_lowest_first() {
        let summary = AttendanceSummary {
            subjects: vec![
                subject("CS301", 9, 10, 90.0),
                subject("CS302", 7, 10, 70.0),
                subject("CS303", 5, 10, 50.0),
            ],
            monthly: Vec::new(),
            overall: OverallAttendance {
                total_classes: 30,
                present: 21,
                absent: 9,
                average: 70.0,
            },
        };

        let codes: Vec<&str> = attendance_shortfalls(&summary)
            .into_iter()
            .map(|s| s.code.as_str())
            .collect();
        assert_eq!(codes, vec!["CS303", "CS302"]);
    }

    #[test]
    fn empty_report_has_placeholders() {
        let attendance = AttendanceSummary {
            subjects: Vec::new(),
            monthly: Vec::new(),
            overall: OverallAttendance {
                total_classes: 0,
                present: 0,
                absent: 0,
                average: 0.0,
            },
        };

        let report = build_report(
            &student(),
            date(2026, 3, 1),
            &attendance,
            &empty_standing(),
            &empty_fees(),
            &[],
        );
        assert!(report.contains("Generated for Rahul Kumar (rahul@university.edu) on 2026-03-01"));
        assert!(report.contains("No attendance recorded yet."));
        assert!(report.contains("No results published yet."));
        assert!(report.contains("Total ₹0, paid ₹0, pending ₹0"));
        assert!(report.contains("Nothing outstanding."));
    }

    #[test]
    fn report_lists_standing_fees_and_open_work() {
        let attendance = AttendanceSummary {
            subjects: vec![subject("CS301", 2, 3, 66.7)],
            monthly: vec![MonthlyAttendance {
                month: "Jan".to_string(),
                key: "2026-01".to_string(),
                present: 2,
                absent: 1,
                total: 3,
                pct: 66.7,
            }],
            overall: OverallAttendance {
                total_classes: 3,
                present: 2,
                absent: 1,
                average: 66.7,
            },
        };
        let standing = AcademicStanding {
            results: vec![ResultRow {
                code: "CS301".to_string(),
                subject: "Data Structures".to_string(),
                semester: 5,
                internal: 38,
                external: 58,
                total: 96,
                grade: "A".to_string(),
                credits: 4,
            }],
            sgpa: 9.0,
            cgpa: 9.0,
            total_credits: 4,
            semesters: vec![5],
        };
        let fees = FeeOverview {
            fees: vec![FeeRow {
                id: Uuid::nil(),
                description: "Sem 6 Lab Fee".to_string(),
                amount: 800_000,
                paid: 0,
                status: FeeStatus::Pending,
                due_date: date(2026, 3, 15),
                paid_at: None,
            }],
            summary: FeeSummary {
                total: 800_000,
                paid: 0,
                pending: 800_000,
            },
        };
        let assignments = vec![AssignmentRow {
            id: Uuid::nil(),
            title: "DSA Assignment 5 - Trees".to_string(),
            subject: "CS301".to_string(),
            deadline: date(2026, 3, 5),
            status: AssignmentStatus::Pending,
            submitted: false,
            grade: None,
            file_path: None,
        }];

        let report = build_report(
            &student(),
            date(2026, 3, 1),
            &attendance,
            &standing,
            &fees,
            &assignments,
        );
        assert!(report.contains("Overall 66.7% (2 of 3 classes attended)"));
        assert!(report.contains("- Jan (2026-01): 66.7% (2 present, 1 absent of 3)"));
        assert!(report.contains("Below 75%:\n- CS301 at 66.7%"));
        assert!(report.contains("SGPA 9.0, CGPA 9.0 across 4 credits"));
        assert!(
            report.contains("### Semester 5\n- CS301 Data Structures: A (96 marks, 4 credits)")
        );
        assert!(report.contains("- Sem 6 Lab Fee due 2026-03-15: ₹8,000"));
        assert!(report.contains("- DSA Assignment 5 - Trees (CS301) due 2026-03-05"));
    }
}
