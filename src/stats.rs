use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AttendanceRecord, AttendanceStatus, Class};

/// Per-status attendance counts, either for one day's session or for a
/// student's whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

impl StatusCounts {
    pub fn bump(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
        }
    }

    /// Sessions that bill: late counts as attended.
    pub fn attended(&self) -> u32 {
        self.present + self.late
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodaySummary {
    pub present: usize,
    pub total: usize,
}

/// Counts the statuses of one in-progress session. The session map is
/// total over the roster, so the three counters sum to the roster size.
pub fn daily_summary(session: &BTreeMap<String, AttendanceStatus>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for status in session.values() {
        counts.bump(*status);
    }
    counts
}

/// Dashboard numbers for one date: per class, how many of the roster showed
/// up. Late counts as attended here; a class with no record for the date
/// reads 0 / roster size.
pub fn class_today_summary(
    classes: &[Class],
    records: &[AttendanceRecord],
    today: &str,
) -> BTreeMap<String, TodaySummary> {
    let mut summary = BTreeMap::new();
    for class in classes {
        let present = records
            .iter()
            .find(|r| r.class_id == class.id && r.date == today)
            .map(|r| {
                r.records
                    .iter()
                    .filter(|d| {
                        matches!(d.status, AttendanceStatus::Present | AttendanceStatus::Late)
                    })
                    .count()
            })
            .unwrap_or(0);
        summary.insert(
            class.id.clone(),
            TodaySummary {
                present,
                total: class.students.len(),
            },
        );
    }
    summary
}

/// Lifetime counts per student over every record of the class.
///
/// Stats are anchored to the current roster: every roster student gets an
/// entry (zeroed when unseen), and historical rows for removed students are
/// skipped even though they stay stored.
pub fn student_lifetime_stats(
    class: &Class,
    records: &[AttendanceRecord],
) -> BTreeMap<String, StatusCounts> {
    let mut stats: BTreeMap<String, StatusCounts> = class
        .students
        .iter()
        .map(|s| (s.id.clone(), StatusCounts::default()))
        .collect();

    for record in records.iter().filter(|r| r.class_id == class.id) {
        for row in &record.records {
            if let Some(counts) = stats.get_mut(&row.student_id) {
                counts.bump(row.status);
            }
        }
    }
    stats
}

/// Amount owed for the counted sessions. Absence never bills; a late
/// arrival bills as a full session.
pub fn tuition_due(counts: &StatusCounts, tuition_fee: i64) -> i64 {
    i64::from(counts.attended()) * tuition_fee
}
