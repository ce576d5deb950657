use std::collections::BTreeSet;

use tracing::warn;

use crate::format::round_to_tenth;
use crate::models::{AcademicStanding, ResultRecord, ResultRow};

/// Outcome of looking a letter grade up in the fixed ten-point table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradePoint {
    Known(u8),
    /// Grade string outside the table (e.g. "I" for incomplete). Counts as zero.
    Unknown,
}

impl GradePoint {
    pub fn lookup(grade: &str) -> Self {
        match grade {
            "A+" => GradePoint::Known(10),
            "A" => GradePoint::Known(9),
            "B+" => GradePoint::Known(8),
            "B" => GradePoint::Known(7),
            "C+" => GradePoint::Known(6),
            "C" => GradePoint::Known(5),
            "D" => GradePoint::Known(4),
            "F" => GradePoint::Known(0),
            _ => GradePoint::Unknown,
        }
    }

    pub fn points(&self) -> u8 {
        match self {
            GradePoint::Known(points) => *points,
            GradePoint::Unknown => 0,
        }
    }
}

/// Credit-weighted grade point average, rounded to one decimal. Zero credits give 0.
pub fn weighted_gpa<'a, I>(results: I) -> f64
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let mut credits: i64 = 0;
    let mut weighted: i64 = 0;

    for result in results {
        let grade_point = GradePoint::lookup(&result.grade);
        if grade_point == GradePoint::Unknown {
            warn!(
                subject = %result.subject_code,
                semester = result.semester,
                grade = %result.grade,
                "grade outside the point table counts as zero"
            );
        }
        credits += i64::from(result.credits);
        weighted += i64::from(grade_point.points()) * i64::from(result.credits);
    }

    if credits == 0 {
        return 0.0;
    }
    round_to_tenth(weighted as f64 / credits as f64)
}

pub fn latest_semester(results: &[ResultRecord]) -> Option<i32> {
    results.iter().map(|r| r.semester).max()
}

pub fn sgpa(results: &[ResultRecord]) -> f64 {
    match latest_semester(results) {
        Some(latest) => weighted_gpa(results.iter().filter(|r| r.semester == latest)),
        None => 0.0,
    }
}

pub fn cgpa(results: &[ResultRecord]) -> f64 {
    weighted_gpa(results)
}

/// Distinct semesters, newest first, matching the listing order.
pub fn semesters(results: &[ResultRecord]) -> Vec<i32> {
    let distinct: BTreeSet<i32> = results.iter().map(|r| r.semester).collect();
    distinct.into_iter().rev().collect()
}

/// Standing over the full result set. `semester_filter` narrows only the
/// returned rows; every aggregate still covers all semesters.
pub fn standing(results: &[ResultRecord], semester_filter: Option<i32>) -> AcademicStanding {
    let mut rows: Vec<&ResultRecord> = results
        .iter()
        .filter(|r| semester_filter.map_or(true, |semester| r.semester == semester))
        .collect();
    rows.sort_by(|a, b| {
        b.semester
            .cmp(&a.semester)
            .then_with(|| a.subject_code.cmp(&b.subject_code))
    });

    AcademicStanding {
        results: rows
            .into_iter()
            .map(|r| ResultRow {
                code: r.subject_code.clone(),
                subject: r.subject_name.clone(),
                semester: r.semester,
                internal: r.internal,
                external: r.external,
                total: r.internal + r.external,
                grade: r.grade.clone(),
                credits: r.credits,
            })
            .collect(),
        sgpa: sgpa(results),
        cgpa: cgpa(results),
        total_credits: results.iter().map(|r| i64::from(r.credits)).sum(),
        semesters: semesters(results),
    }
}
