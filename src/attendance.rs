use std::collections::BTreeMap;

use crate::format::percentage;
use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, MonthlyAttendance, OverallAttendance,
    SubjectAttendance,
};

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    present: i64,
    absent: i64,
}

impl Tally {
    fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    fn total(&self) -> i64 {
        self.present + self.absent
    }
}

/// Builds the per-subject, per-month and overall views for one user's records.
pub fn summarize(records: &[AttendanceRecord]) -> AttendanceSummary {
    let subjects = by_subject(records);
    let monthly = by_month(records);
    let overall = overall(&subjects);

    AttendanceSummary {
        subjects,
        monthly,
        overall,
    }
}

/// Groups by `(subject_code, subject_name)`, ordered by code.
pub fn by_subject(records: &[AttendanceRecord]) -> Vec<SubjectAttendance> {
    let mut groups: BTreeMap<(&str, &str), Tally> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.subject_code.as_str(), record.subject_name.as_str()))
            .or_default()
            .record(record.status);
    }

    groups
        .into_iter()
        .map(|((code, name), tally)| SubjectAttendance {
            code: code.to_string(),
            subject: name.to_string(),
            present: tally.present,
            absent: tally.absent,
            total: tally.total(),
            pct: percentage(tally.present, tally.total()),
        })
        .collect()
}

/// Groups by calendar month. The `YYYY-MM` key keeps January 2025 and
/// January 2026 apart and orders the output chronologically.
pub fn by_month(records: &[AttendanceRecord]) -> Vec<MonthlyAttendance> {
    let mut groups: BTreeMap<String, (String, Tally)> = BTreeMap::new();

    for record in records {
        let key = record.date.format("%Y-%m").to_string();
        groups
            .entry(key)
            .or_insert_with(|| (record.date.format("%b").to_string(), Tally::default()))
            .1
            .record(record.status);
    }

    groups
        .into_iter()
        .map(|(key, (month, tally))| MonthlyAttendance {
            month,
            key,
            present: tally.present,
            absent: tally.absent,
            total: tally.total(),
            pct: percentage(tally.present, tally.total()),
        })
        .collect()
}

pub fn overall(subjects: &[SubjectAttendance]) -> OverallAttendance {
    let total_classes: i64 = subjects.iter().map(|s| s.total).sum();
    let present: i64 = subjects.iter().map(|s| s.present).sum();

    OverallAttendance {
        total_classes,
        present,
        absent: total_classes - present,
        average: percentage(present, total_classes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn record(code: &str, date: (i32, u32, u32), status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            user_id: Uuid::nil(),
            subject_code: code.to_string(),
            subject_name: format!("{code} name"),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
            status,
        }
    }

    #[test]
    fn subject_summary_counts_and_rounds() {
        let records = vec![
            record("CS101", (2026, 1, 2), AttendanceStatus::Present),
            record("CS101", (2026, 1, 9), AttendanceStatus::Absent),
            record("CS101", (2026, 1, 16), AttendanceStatus::Present),
        ];

        let subjects = by_subject(&records);
        assert_eq!(subjects.len(), 1);
        let cs101 = &subjects[0];
        assert_eq!(cs101.present, 2);
        assert_eq!(cs101.absent, 1);
        assert_eq!(cs101.total, 3);
        assert_eq!(cs101.pct, 66.7);
    }

    #[test]
    fn subjects_are_ordered_by_code() {
        let records = vec![
            record("CS303", (2026, 1, 2), AttendanceStatus::Present),
            record("CS101", (2026, 1, 2), AttendanceStatus::Present),
            record("CS202", (2026, 1, 2), AttendanceStatus::Absent),
        ];

        let codes: Vec<String> = by_subject(&records).into_iter().map(|s| s.code).collect();
        assert_eq!(codes, vec!["CS101", "CS202", "CS303"]);
    }

    #[test]
    fn months_stay_apart_across_years() {
        let records = vec![
            record("CS101", (2026, 1, 5), AttendanceStatus::Absent),
            record("CS101", (2025, 1, 5), AttendanceStatus::Present),
            record("CS101", (2025, 12, 1), AttendanceStatus::Present),
            record("CS101", (2025, 12, 3), AttendanceStatus::Absent),
        ];

        let monthly = by_month(&records);
        let keys: Vec<&str> = monthly.iter().map(|m| m.key.as_str()).collect();
        let labels: Vec<&str> = monthly.iter().map(|m| m.month.as_str()).collect();
        let pcts: Vec<f64> = monthly.iter().map(|m| m.pct).collect();

        assert_eq!(keys, vec!["2025-01", "2025-12", "2026-01"]);
        assert_eq!(labels, vec!["Jan", "Dec", "Jan"]);
        assert_eq!(pcts, vec![100.0, 50.0, 0.0]);
    }

    #[test]
    fn totals_always_balance() {
        let statuses = [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Present,
            AttendanceStatus::Present,
        ];
        let mut records = Vec::new();
        for (index, code) in ["MA101", "PH102", "CS103"].iter().enumerate() {
            for day in 1..=20u32 {
                let status = statuses[(day as usize + index) % statuses.len()];
                let month = if day % 2 == 0 { 2 } else { 3 };
                records.push(record(code, (2026, month, day), status));
            }
        }

        let summary = summarize(&records);
        for subject in &summary.subjects {
            assert_eq!(subject.present + subject.absent, subject.total);
            assert!((0.0..=100.0).contains(&subject.pct));
        }
        for month in &summary.monthly {
            assert_eq!(month.present + month.absent, month.total);
            assert!((0.0..=100.0).contains(&month.pct));
        }
        let overall = &summary.overall;
        assert_eq!(overall.present + overall.absent, overall.total_classes);
        assert_eq!(overall.total_classes, 60);
        assert_eq!(overall.present, 45);
        assert_eq!(overall.average, 75.0);
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let summary = summarize(&[]);
        assert!(summary.subjects.is_empty());
        assert!(summary.monthly.is_empty());
        assert_eq!(summary.overall.total_classes, 0);
        assert_eq!(summary.overall.absent, 0);
        assert_eq!(summary.overall.average, 0.0);
    }

    #[test]
    fn monthly_key_is_not_serialized() {
        let records = vec![record("CS101", (2026, 2, 3), AttendanceStatus::Present)];
        let json = serde_json::to_value(summarize(&records)).expect("serializes");
        assert_eq!(json["monthly"][0], serde_json::json!({ "month": "Feb", "pct": 100.0 }));
        assert_eq!(json["overall"]["totalClasses"], 1);
    }
}
