// 📊 Statistics Aggregator - attendance rates and enrollment counts
// Read-only reductions over persisted rows. Reads here are snapshots: they
// are not coordinated with concurrent writers, so a dashboard refresh can
// observe a stale or partially-updated view. Callers that need a consistent
// picture must run these queries inside their own transaction.

use crate::models::{AttendanceStatus, EnrollmentStatus};
use anyhow::Result;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Round half-up to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn rate(present: i64, late: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0; // no recorded sessions, not a division error
    }
    round2((present + late) as f64 / total as f64 * 100.0)
}

// ============================================================================
// ATTENDANCE
// ============================================================================

/// Per (student, course) attendance summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    pub total: i64,
    /// Percentage of sessions marked PRESENT or LATE, half-up to 2 dp
    pub attendance_rate: f64,
}

/// Per-course attendance summary; adds the number of distinct students
/// with at least one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAttendanceStats {
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    pub total: i64,
    pub attendance_rate: f64,
    pub unique_students: i64,
}

fn status_counts(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<HashMap<AttendanceStatus, i64>> {
    let mut counts: HashMap<AttendanceStatus, i64> = HashMap::new();
    for status in AttendanceStatus::ALL {
        counts.insert(status, 0);
    }

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        let status: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        Ok((status, count))
    })?;

    for row in rows {
        let (status_text, count) = row?;
        if let Ok(status) = status_text.parse::<AttendanceStatus>() {
            counts.insert(status, count);
        }
    }

    Ok(counts)
}

pub fn attendance_statistics(
    conn: &Connection,
    student_id: i64,
    course_id: i64,
) -> Result<AttendanceStats> {
    let counts = status_counts(
        conn,
        "SELECT status, COUNT(*) FROM attendance_records
         WHERE student_id = ?1 AND course_id = ?2 GROUP BY status",
        &[&student_id, &course_id],
    )?;

    let present = counts[&AttendanceStatus::Present];
    let absent = counts[&AttendanceStatus::Absent];
    let late = counts[&AttendanceStatus::Late];
    let excused = counts[&AttendanceStatus::Excused];
    let total = present + absent + late + excused;

    Ok(AttendanceStats {
        present,
        absent,
        late,
        excused,
        total,
        attendance_rate: rate(present, late, total),
    })
}

pub fn course_attendance_statistics(
    conn: &Connection,
    course_id: i64,
) -> Result<CourseAttendanceStats> {
    let counts = status_counts(
        conn,
        "SELECT status, COUNT(*) FROM attendance_records
         WHERE course_id = ?1 GROUP BY status",
        &[&course_id],
    )?;

    let present = counts[&AttendanceStatus::Present];
    let absent = counts[&AttendanceStatus::Absent];
    let late = counts[&AttendanceStatus::Late];
    let excused = counts[&AttendanceStatus::Excused];
    let total = present + absent + late + excused;

    let unique_students: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT student_id) FROM attendance_records WHERE course_id = ?1",
        params![course_id],
        |row| row.get(0),
    )?;

    Ok(CourseAttendanceStats {
        present,
        absent,
        late,
        excused,
        total,
        attendance_rate: rate(present, late, total),
        unique_students,
    })
}

// ============================================================================
// ENROLLMENT COUNTS
// ============================================================================

/// Enrollment counts for a course, grouped by status
pub fn enrollment_status_counts(
    conn: &Connection,
    course_id: i64,
) -> Result<HashMap<EnrollmentStatus, i64>> {
    let mut counts: HashMap<EnrollmentStatus, i64> = HashMap::new();
    for status in EnrollmentStatus::ALL {
        counts.insert(status, 0);
    }

    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM enrollments WHERE course_id = ?1 GROUP BY status",
    )?;
    let rows = stmt.query_map(params![course_id], |row| {
        let status: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        Ok((status, count))
    })?;

    for row in rows {
        let (status_text, count) = row?;
        if let Ok(status) = status_text.parse::<EnrollmentStatus>() {
            counts.insert(status, count);
        }
    }

    Ok(counts)
}

/// Count of ENROLLED records across the whole store (dashboard headline)
pub fn total_active_enrollments(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE status = 'ENROLLED'",
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================
