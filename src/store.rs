// 💾 Persistence Gateway - SQLite-backed CRUD for the records engine
// All query functions take &Connection so callers can run a whole operation
// inside one rusqlite::Transaction (Transaction derefs to Connection).
// The engine stays oblivious to connection management.

use crate::models::{
    AttendanceRecord, AttendanceStatus, Course, Enrollment, EnrollmentStatus, Student,
};
use crate::validation::DATE_FORMAT;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_schema(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            registration_number TEXT UNIQUE NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            current_semester INTEGER NOT NULL,
            enrollment_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            credits INTEGER NOT NULL,
            semester INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            course_id INTEGER NOT NULL REFERENCES courses(id),
            enrollment_date TEXT NOT NULL,
            status TEXT NOT NULL
        )",
        [],
    )?;

    // One row per (student, course, date); duplicate inserts are rejected,
    // never overwritten
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            course_id INTEGER NOT NULL REFERENCES courses(id),
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            remarks TEXT,
            UNIQUE(student_id, course_id, date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_course ON attendance_records(course_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn sql_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn enrollment_status_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<EnrollmentStatus> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn attendance_status_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<AttendanceStatus> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn map_student(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        registration_number: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        current_semester: row.get(6)?,
        enrollment_date: date_from_row(row, 7)?,
    })
}

fn map_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        credits: row.get(3)?,
        semester: row.get(4)?,
    })
}

fn map_enrollment(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
        enrollment_date: date_from_row(row, 3)?,
        status: enrollment_status_from_row(row, 4)?,
    })
}

fn map_attendance(row: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
        date: date_from_row(row, 3)?,
        status: attendance_status_from_row(row, 4)?,
        remarks: row.get(5)?,
    })
}

// Extended code, not the generic ConstraintViolation class: foreign-key
// failures must surface as errors, only the UNIQUE key collision is the
// insert-or-skip path.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ============================================================================
// STUDENTS
// ============================================================================

pub fn insert_student(conn: &Connection, student: &Student) -> Result<i64> {
    conn.execute(
        "INSERT INTO students (registration_number, first_name, last_name, email, phone,
                               current_semester, enrollment_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            student.registration_number,
            student.first_name,
            student.last_name,
            student.email,
            student.phone,
            student.current_semester,
            sql_date(student.enrollment_date),
        ],
    )
    .context("Failed to insert student")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_student(conn: &Connection, id: i64) -> Result<Option<Student>> {
    let student = conn
        .query_row(
            "SELECT id, registration_number, first_name, last_name, email, phone,
                    current_semester, enrollment_date
             FROM students WHERE id = ?1",
            params![id],
            map_student,
        )
        .optional()?;

    Ok(student)
}

pub fn get_student_by_registration(conn: &Connection, reg_number: &str) -> Result<Option<Student>> {
    let student = conn
        .query_row(
            "SELECT id, registration_number, first_name, last_name, email, phone,
                    current_semester, enrollment_date
             FROM students WHERE registration_number = ?1",
            params![reg_number],
            map_student,
        )
        .optional()?;

    Ok(student)
}

pub fn get_all_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT id, registration_number, first_name, last_name, email, phone,
                current_semester, enrollment_date
         FROM students ORDER BY registration_number",
    )?;

    let students = stmt
        .query_map([], map_student)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(students)
}

pub fn update_student(conn: &Connection, student: &Student) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE students
         SET registration_number = ?1, first_name = ?2, last_name = ?3, email = ?4,
             phone = ?5, current_semester = ?6, enrollment_date = ?7
         WHERE id = ?8",
        params![
            student.registration_number,
            student.first_name,
            student.last_name,
            student.email,
            student.phone,
            student.current_semester,
            sql_date(student.enrollment_date),
            student.id,
        ],
    )?;

    Ok(rows > 0)
}

// ============================================================================
// COURSES
// ============================================================================

pub fn insert_course(conn: &Connection, course: &Course) -> Result<i64> {
    conn.execute(
        "INSERT INTO courses (code, name, credits, semester) VALUES (?1, ?2, ?3, ?4)",
        params![course.code, course.name, course.credits, course.semester],
    )
    .context("Failed to insert course")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_course(conn: &Connection, id: i64) -> Result<Option<Course>> {
    let course = conn
        .query_row(
            "SELECT id, code, name, credits, semester FROM courses WHERE id = ?1",
            params![id],
            map_course,
        )
        .optional()?;

    Ok(course)
}

pub fn get_course_by_code(conn: &Connection, code: &str) -> Result<Option<Course>> {
    let course = conn
        .query_row(
            "SELECT id, code, name, credits, semester FROM courses WHERE code = ?1",
            params![code],
            map_course,
        )
        .optional()?;

    Ok(course)
}

pub fn get_all_courses(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt =
        conn.prepare("SELECT id, code, name, credits, semester FROM courses ORDER BY code")?;

    let courses = stmt
        .query_map([], map_course)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(courses)
}

/// Deleting a course is refused while enrollments or attendance still
/// reference it; dependent records must go first.
pub fn delete_course(conn: &Connection, id: i64) -> Result<bool> {
    let enrollment_refs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    let attendance_refs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM attendance_records WHERE course_id = ?1",
        params![id],
        |row| row.get(0),
    )?;

    if enrollment_refs > 0 || attendance_refs > 0 {
        bail!(
            "course {id} still has {enrollment_refs} enrollment(s) and {attendance_refs} attendance record(s)"
        );
    }

    let rows = conn.execute("DELETE FROM courses WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

// ============================================================================
// ENROLLMENTS
// ============================================================================

pub fn insert_enrollment(conn: &Connection, enrollment: &Enrollment) -> Result<i64> {
    conn.execute(
        "INSERT INTO enrollments (student_id, course_id, enrollment_date, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            enrollment.student_id,
            enrollment.course_id,
            sql_date(enrollment.enrollment_date),
            enrollment.status.as_str(),
        ],
    )
    .context("Failed to insert enrollment")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_enrollment(conn: &Connection, id: i64) -> Result<Option<Enrollment>> {
    let enrollment = conn
        .query_row(
            "SELECT id, student_id, course_id, enrollment_date, status
             FROM enrollments WHERE id = ?1",
            params![id],
            map_enrollment,
        )
        .optional()?;

    Ok(enrollment)
}

pub fn enrollments_by_student(conn: &Connection, student_id: i64) -> Result<Vec<Enrollment>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, course_id, enrollment_date, status
         FROM enrollments WHERE student_id = ?1 ORDER BY enrollment_date",
    )?;

    let enrollments = stmt
        .query_map(params![student_id], map_enrollment)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(enrollments)
}

pub fn enrollments_by_course(conn: &Connection, course_id: i64) -> Result<Vec<Enrollment>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, course_id, enrollment_date, status
         FROM enrollments WHERE course_id = ?1 ORDER BY enrollment_date",
    )?;

    let enrollments = stmt
        .query_map(params![course_id], map_enrollment)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(enrollments)
}

/// Active = ENROLLED or PENDING; this is the number the capacity rule
/// compares against
pub fn count_active_enrollments(conn: &Connection, course_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments
         WHERE course_id = ?1 AND status IN ('ENROLLED', 'PENDING')",
        params![course_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Identity-preserving status update; the sanctioned mutation path for
/// enrollment records
pub fn update_enrollment_status(
    conn: &Connection,
    id: i64,
    status: EnrollmentStatus,
) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE enrollments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;

    Ok(rows > 0)
}

pub fn delete_enrollment(conn: &Connection, id: i64) -> Result<bool> {
    let rows = conn.execute("DELETE FROM enrollments WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

// ============================================================================
// ATTENDANCE
// ============================================================================

/// Insert an attendance record. Returns `Ok(None)` when a record for the
/// same (student, course, date) key already exists; the existing row is
/// left untouched. Unknown student/course references fail the foreign-key
/// constraint and come back as errors.
pub fn insert_attendance(conn: &Connection, record: &AttendanceRecord) -> Result<Option<i64>> {
    let result = conn.execute(
        "INSERT INTO attendance_records (student_id, course_id, date, status, remarks)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.student_id,
            record.course_id,
            sql_date(record.date),
            record.status.as_str(),
            record.remarks,
        ],
    );

    match result {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_attendance(conn: &Connection, id: i64) -> Result<Option<AttendanceRecord>> {
    let record = conn
        .query_row(
            "SELECT id, student_id, course_id, date, status, remarks
             FROM attendance_records WHERE id = ?1",
            params![id],
            map_attendance,
        )
        .optional()?;

    Ok(record)
}

pub fn get_attendance_by_key(
    conn: &Connection,
    student_id: i64,
    course_id: i64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>> {
    let record = conn
        .query_row(
            "SELECT id, student_id, course_id, date, status, remarks
             FROM attendance_records
             WHERE student_id = ?1 AND course_id = ?2 AND date = ?3",
            params![student_id, course_id, sql_date(date)],
            map_attendance,
        )
        .optional()?;

    Ok(record)
}

pub fn attendance_for_student_course(
    conn: &Connection,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, course_id, date, status, remarks
         FROM attendance_records
         WHERE student_id = ?1 AND course_id = ?2 ORDER BY date",
    )?;

    let records = stmt
        .query_map(params![student_id, course_id], map_attendance)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

/// Update by identity in a single statement; returns the updated row, or
/// `None` if the identity does not exist.
pub fn update_attendance(
    conn: &Connection,
    id: i64,
    status: AttendanceStatus,
    remarks: Option<&str>,
) -> Result<Option<AttendanceRecord>> {
    let record = conn
        .query_row(
            "UPDATE attendance_records SET status = ?1, remarks = ?2 WHERE id = ?3
             RETURNING id, student_id, course_id, date, status, remarks",
            params![status.as_str(), remarks, id],
            map_attendance,
        )
        .optional()?;

    Ok(record)
}

pub fn delete_attendance(conn: &Connection, id: i64) -> Result<bool> {
    let rows = conn.execute("DELETE FROM attendance_records WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

// ============================================================================
// DIRECTORY / CATALOG SEAMS
// ============================================================================

/// Lookup interface over the student directory. The engine only needs
/// existence checks and immutable snapshots.
pub trait StudentDirectory {
    fn find_student(&self, id: i64) -> Result<Option<Student>>;

    fn student_exists(&self, id: i64) -> Result<bool> {
        Ok(self.find_student(id)?.is_some())
    }
}

/// Lookup interface over the course catalog.
pub trait CourseCatalog {
    fn find_course(&self, id: i64) -> Result<Option<Course>>;
    fn find_course_by_code(&self, code: &str) -> Result<Option<Course>>;

    fn course_exists(&self, id: i64) -> Result<bool> {
        Ok(self.find_course(id)?.is_some())
    }
}

// A Transaction derefs to Connection, so eligibility checks run against
// the same transaction as the insert that follows them.
impl StudentDirectory for Connection {
    fn find_student(&self, id: i64) -> Result<Option<Student>> {
        get_student(self, id)
    }
}

impl CourseCatalog for Connection {
    fn find_course(&self, id: i64) -> Result<Option<Course>> {
        get_course(self, id)
    }

    fn find_course_by_code(&self, code: &str) -> Result<Option<Course>> {
        get_course_by_code(self, code)
    }
}

// ============================================================================
// TESTS
// ============================================================================
