use std::collections::BTreeMap;

use crate::model::{AttendanceData, AttendanceRecord, AttendanceStatus, Class};

/// Builds the editable status map for one class on one date.
///
/// Every student on the current roster gets exactly one entry: the value
/// recorded for that date when one exists, `present` otherwise. Historical
/// entries for students no longer on the roster are ignored. A missing
/// record is the normal case for a new day, not an error.
pub fn build_session_status(
    class: &Class,
    date: &str,
    records: &[AttendanceRecord],
) -> BTreeMap<String, AttendanceStatus> {
    let existing = records
        .iter()
        .find(|r| r.class_id == class.id && r.date == date);

    let mut session = BTreeMap::new();
    for student in &class.students {
        let status = existing
            .and_then(|r| {
                r.records
                    .iter()
                    .find(|d| d.student_id == student.id)
                    .map(|d| d.status)
            })
            .unwrap_or(AttendanceStatus::Present);
        session.insert(student.id.clone(), status);
    }
    session
}

/// Saves one committed session into the record collection.
///
/// Pure upsert keyed by (classId, date): an existing record keeps its
/// position and gets its rows replaced, otherwise a new record is appended.
/// The input collection is not touched; the caller persists the returned one.
pub fn commit_session(
    class_id: &str,
    date: &str,
    session: &BTreeMap<String, AttendanceStatus>,
    records: &[AttendanceRecord],
) -> Vec<AttendanceRecord> {
    let rows: Vec<AttendanceData> = session
        .iter()
        .map(|(student_id, status)| AttendanceData {
            student_id: student_id.clone(),
            status: *status,
        })
        .collect();

    let mut out = records.to_vec();
    match out
        .iter_mut()
        .find(|r| r.class_id == class_id && r.date == date)
    {
        Some(existing) => existing.records = rows,
        None => out.push(AttendanceRecord {
            class_id: class_id.to_string(),
            date: date.to_string(),
            records: rows,
        }),
    }
    out
}
