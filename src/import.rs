use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::models::AttendanceRecord;

/// Reads attendance rows with headers
/// `user_id,subject_code,subject_name,date,status`.
pub fn read_attendance_csv(path: &Path) -> anyhow::Result<Vec<AttendanceRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_attendance(file)
}

pub fn parse_attendance<R: Read>(input: R) -> anyhow::Result<Vec<AttendanceRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<AttendanceRecord>().enumerate() {
        // Header is line 1.
        let record = row.with_context(|| format!("invalid attendance row on line {}", index + 2))?;
        records.push(record);
    }

    Ok(records)
}
