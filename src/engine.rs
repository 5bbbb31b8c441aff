// 🎛️ Enrollment Engine - public operations over the records store
// Every operation runs validate -> check -> persist to completion on the
// calling thread. Expected failures come back through OpResult; store
// failures are caught here, logged, and converted -- they never propagate
// past this boundary.

use crate::config::EngineConfig;
use crate::eligibility::EligibilityValidator;
use crate::error::EngineError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, Course, Enrollment, EnrollmentStatus, Student,
};
use crate::stats::{self, AttendanceStats, CourseAttendanceStats};
use crate::store;
use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

// ============================================================================
// RESULT SHAPE
// ============================================================================

/// Uniform operation result: expected failure modes are values, not panics
/// or errors thrown across the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResult<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<Vec<String>>,
}

impl<T> OpResult<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        OpResult {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        OpResult {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn from_error(err: &EngineError) -> Self {
        match err {
            EngineError::ValidationFailed(violations) => OpResult {
                success: false,
                message: "Validation failed".to_string(),
                data: None,
                errors: Some(violations.clone()),
            },
            other => OpResult {
                success: false,
                message: other.to_string(),
                data: None,
                errors: None,
            },
        }
    }
}

fn finish<T>(outcome: Result<OpResult<T>, EngineError>) -> OpResult<T> {
    match outcome {
        Ok(result) => result,
        Err(err) => {
            match &err {
                EngineError::Store(msg) => error!(%msg, "store failure"),
                expected => warn!(%expected, "operation rejected"),
            }
            OpResult::from_error(&err)
        }
    }
}

// ============================================================================
// FIELD VALIDATION (collect-all)
// ============================================================================

/// A single field-level violation. Field validation accumulates every
/// violation instead of stopping at the first so callers see all problems
/// at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_student(student: &Student) -> Vec<FieldError> {
    use crate::validation::*;
    let mut errors = Vec::new();

    if !is_valid_registration_number(&student.registration_number) {
        errors.push(FieldError::new(
            "registration_number",
            "Invalid registration number format. Expected format: ABC/123/12345",
        ));
    }
    if !is_valid_name(&student.first_name) {
        errors.push(FieldError::new(
            "first_name",
            "Only alphabetic characters, spaces, hyphens and apostrophes are allowed",
        ));
    }
    if !is_valid_name(&student.last_name) {
        errors.push(FieldError::new(
            "last_name",
            "Only alphabetic characters, spaces, hyphens and apostrophes are allowed",
        ));
    }
    if !is_valid_email(&student.email) {
        errors.push(FieldError::new("email", "Invalid email address format"));
    }
    if !is_valid_phone_number(&student.phone) {
        errors.push(FieldError::new("phone", "Invalid phone number format"));
    }
    if !Student::is_valid_semester(student.current_semester) {
        errors.push(FieldError::new(
            "current_semester",
            "Semester must be between 1 and 8",
        ));
    }
    if !Student::is_valid_enrollment_date(student.enrollment_date) {
        errors.push(FieldError::new(
            "enrollment_date",
            "Enrollment date cannot be in the future",
        ));
    }

    errors
}

pub fn validate_course(course: &Course) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !Course::is_valid_code(&course.code) {
        errors.push(FieldError::new(
            "code",
            "Course code must be 2-4 letters followed by 3-4 digits (e.g. CS101)",
        ));
    }
    if !Course::is_valid_name(&course.name) {
        errors.push(FieldError::new(
            "name",
            "Course name must be between 3 and 100 characters",
        ));
    }
    if !Course::is_valid_credits(course.credits) {
        errors.push(FieldError::new("credits", "Credits must be between 1 and 6"));
    }
    if !Course::is_valid_semester(course.semester) {
        errors.push(FieldError::new(
            "semester",
            "Semester must be between 1 and 8",
        ));
    }

    errors
}

pub fn validate_enrollment(enrollment: &Enrollment) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !Enrollment::is_valid_student_id(enrollment.student_id) {
        errors.push(FieldError::new(
            "student_id",
            "Student ID must be a positive integer",
        ));
    }
    if !Enrollment::is_valid_course_id(enrollment.course_id) {
        errors.push(FieldError::new(
            "course_id",
            "Course ID must be a positive integer",
        ));
    }
    if !Enrollment::is_valid_enrollment_date(enrollment.enrollment_date) {
        errors.push(FieldError::new(
            "enrollment_date",
            "Enrollment date cannot be in the future",
        ));
    }

    errors
}

fn as_validation_error(errors: Vec<FieldError>) -> EngineError {
    EngineError::ValidationFailed(errors.iter().map(|e| e.to_string()).collect())
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    conn: Connection,
    config: EngineConfig,
    validator: EligibilityValidator,
}

impl Engine {
    /// Wrap an existing connection. The schema is created if missing.
    pub fn new(conn: Connection, config: EngineConfig) -> Result<Self> {
        store::setup_schema(&conn)?;
        let validator = EligibilityValidator::from_config(&config);
        Ok(Engine {
            conn,
            config,
            validator,
        })
    }

    pub fn open(path: &Path, config: EngineConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::new(conn, config)
    }

    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        Self::new(Connection::open_in_memory()?, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Direct access for read paths that want their own queries (reports,
    /// dashboards). Writes must go through the engine operations.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ------------------------------------------------------------------
    // Students
    // ------------------------------------------------------------------

    pub fn register_student(&self, student: Student) -> OpResult<Student> {
        finish(self.try_register_student(student))
    }

    fn try_register_student(&self, mut student: Student) -> Result<OpResult<Student>, EngineError> {
        let violations = validate_student(&student);
        if !violations.is_empty() {
            return Err(as_validation_error(violations));
        }

        if store::get_student_by_registration(&self.conn, &student.registration_number)?.is_some() {
            return Err(EngineError::ValidationFailed(vec![format!(
                "registration_number: {} is already registered",
                student.registration_number
            )]));
        }

        student.id = store::insert_student(&self.conn, &student)?;
        info!(student_id = student.id, reg = %student.registration_number, "student registered");
        Ok(OpResult::ok("Student registered successfully", student))
    }

    pub fn update_student(&self, student: Student) -> OpResult<Student> {
        finish(self.try_update_student(student))
    }

    fn try_update_student(&self, student: Student) -> Result<OpResult<Student>, EngineError> {
        let violations = validate_student(&student);
        if !violations.is_empty() {
            return Err(as_validation_error(violations));
        }

        if !store::update_student(&self.conn, &student)? {
            return Err(EngineError::NotFound {
                entity: "student",
                id: student.id,
            });
        }

        info!(student_id = student.id, "student updated");
        Ok(OpResult::ok("Student updated successfully", student))
    }

    pub fn student(&self, id: i64) -> Result<Option<Student>, EngineError> {
        Ok(store::get_student(&self.conn, id)?)
    }

    pub fn students(&self) -> Result<Vec<Student>, EngineError> {
        Ok(store::get_all_students(&self.conn)?)
    }

    // ------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------

    pub fn create_course(&self, course: Course) -> OpResult<Course> {
        finish(self.try_create_course(course))
    }

    fn try_create_course(&self, mut course: Course) -> Result<OpResult<Course>, EngineError> {
        let violations = validate_course(&course);
        if !violations.is_empty() {
            return Err(as_validation_error(violations));
        }

        if store::get_course_by_code(&self.conn, &course.code)?.is_some() {
            return Err(EngineError::DuplicateCourseCode(course.code));
        }

        course.id = store::insert_course(&self.conn, &course)?;
        info!(course_id = course.id, code = %course.code, "course created");
        Ok(OpResult::ok("Course created successfully", course))
    }

    pub fn course(&self, id: i64) -> Result<Option<Course>, EngineError> {
        Ok(store::get_course(&self.conn, id)?)
    }

    pub fn course_by_code(&self, code: &str) -> Result<Option<Course>, EngineError> {
        Ok(store::get_course_by_code(&self.conn, code)?)
    }

    pub fn courses(&self) -> Result<Vec<Course>, EngineError> {
        Ok(store::get_all_courses(&self.conn)?)
    }

    // ------------------------------------------------------------------
    // Enrollment lifecycle
    // ------------------------------------------------------------------

    /// Standalone eligibility probe, same rules the create path enforces
    pub fn check_eligibility(&self, student_id: i64, course_id: i64) -> OpResult<()> {
        match self
            .validator
            .check(&self.conn, &self.conn, &self.conn, student_id, course_id)
        {
            Ok(()) => OpResult::ok_empty("Student is eligible for enrollment"),
            Err(err) => finish(Err(err)),
        }
    }

    /// Field validation first (fail fast before eligibility), then the
    /// eligibility check and insert run inside one transaction so a
    /// concurrent writer cannot slip between check and write.
    pub fn create_enrollment(&mut self, enrollment: Enrollment) -> OpResult<Enrollment> {
        finish(self.try_create_enrollment(enrollment))
    }

    fn try_create_enrollment(
        &mut self,
        enrollment: Enrollment,
    ) -> Result<OpResult<Enrollment>, EngineError> {
        let violations = validate_enrollment(&enrollment);
        if !violations.is_empty() {
            return Err(as_validation_error(violations));
        }

        // PENDING is honored for approval workflows; anything else starts
        // as ENROLLED
        let status = if enrollment.status == EnrollmentStatus::Pending {
            EnrollmentStatus::Pending
        } else {
            EnrollmentStatus::Enrolled
        };

        let mut record = Enrollment::with_status(
            enrollment.student_id,
            enrollment.course_id,
            enrollment.enrollment_date,
            status,
        );

        let tx = self.conn.transaction().map_err(EngineError::store)?;
        self.validator
            .check(&*tx, &*tx, &tx, record.student_id, record.course_id)?;
        record.id = store::insert_enrollment(&tx, &record)?;
        tx.commit().map_err(EngineError::store)?;

        info!(
            enrollment_id = record.id,
            student_id = record.student_id,
            course_id = record.course_id,
            status = %record.status,
            "enrollment created"
        );
        Ok(OpResult::ok("Enrollment created successfully", record))
    }

    /// Load, gate through the transition table, persist. An invalid
    /// transition leaves the stored record unchanged.
    pub fn update_enrollment_status(
        &self,
        enrollment_id: i64,
        status: EnrollmentStatus,
    ) -> OpResult<Enrollment> {
        finish(self.try_update_enrollment_status(enrollment_id, status))
    }

    fn try_update_enrollment_status(
        &self,
        enrollment_id: i64,
        status: EnrollmentStatus,
    ) -> Result<OpResult<Enrollment>, EngineError> {
        let mut enrollment = store::get_enrollment(&self.conn, enrollment_id)?.ok_or(
            EngineError::NotFound {
                entity: "enrollment",
                id: enrollment_id,
            },
        )?;

        if !EnrollmentStatus::can_transition(enrollment.status, status) {
            return Err(EngineError::InvalidTransition {
                from: enrollment.status,
                to: status,
            });
        }

        store::update_enrollment_status(&self.conn, enrollment_id, status)?;
        enrollment.status = status;

        info!(enrollment_id, status = %status, "enrollment status updated");
        Ok(OpResult::ok(
            "Enrollment status updated successfully",
            enrollment,
        ))
    }

    /// Removal by identity. With terminal protection on (the default),
    /// COMPLETED and FAILED enrollments are refused.
    pub fn delete_enrollment(&self, enrollment_id: i64) -> OpResult<()> {
        finish(self.try_delete_enrollment(enrollment_id))
    }

    fn try_delete_enrollment(&self, enrollment_id: i64) -> Result<OpResult<()>, EngineError> {
        let enrollment = store::get_enrollment(&self.conn, enrollment_id)?.ok_or(
            EngineError::NotFound {
                entity: "enrollment",
                id: enrollment_id,
            },
        )?;

        if self.config.protect_terminal_enrollments && enrollment.status.is_terminal() {
            return Err(EngineError::DeleteBlocked {
                id: enrollment_id,
                status: enrollment.status,
            });
        }

        store::delete_enrollment(&self.conn, enrollment_id)?;
        info!(enrollment_id, "enrollment deleted");
        Ok(OpResult::ok_empty("Enrollment deleted successfully"))
    }

    pub fn enrollment(&self, id: i64) -> Result<Option<Enrollment>, EngineError> {
        Ok(store::get_enrollment(&self.conn, id)?)
    }

    pub fn enrollments_by_student(&self, student_id: i64) -> Result<Vec<Enrollment>, EngineError> {
        Ok(store::enrollments_by_student(&self.conn, student_id)?)
    }

    pub fn enrollments_by_course(&self, course_id: i64) -> Result<Vec<Enrollment>, EngineError> {
        Ok(store::enrollments_by_course(&self.conn, course_id)?)
    }

    // ------------------------------------------------------------------
    // Attendance
    // ------------------------------------------------------------------

    /// Record attendance. A record for the same (student, course, date)
    /// key already present means rejection, not overwrite.
    pub fn mark_attendance(&self, record: AttendanceRecord) -> OpResult<AttendanceRecord> {
        finish(self.try_mark_attendance(record))
    }

    fn try_mark_attendance(
        &self,
        mut record: AttendanceRecord,
    ) -> Result<OpResult<AttendanceRecord>, EngineError> {
        let mut violations = Vec::new();
        if record.student_id <= 0 {
            violations.push(FieldError::new(
                "student_id",
                "Student ID must be a positive integer",
            ));
        }
        if record.course_id <= 0 {
            violations.push(FieldError::new(
                "course_id",
                "Course ID must be a positive integer",
            ));
        }
        if !violations.is_empty() {
            return Err(as_validation_error(violations));
        }

        match store::insert_attendance(&self.conn, &record)? {
            Some(id) => {
                record.id = id;
                info!(
                    attendance_id = id,
                    student_id = record.student_id,
                    course_id = record.course_id,
                    "attendance marked"
                );
                Ok(OpResult::ok("Attendance recorded successfully", record))
            }
            None => Err(EngineError::DuplicateRecord {
                student_id: record.student_id,
                course_id: record.course_id,
                date: record.date.to_string(),
            }),
        }
    }

    pub fn update_attendance(
        &self,
        id: i64,
        status: AttendanceStatus,
        remarks: Option<&str>,
    ) -> OpResult<AttendanceRecord> {
        finish(self.try_update_attendance(id, status, remarks))
    }

    fn try_update_attendance(
        &self,
        id: i64,
        status: AttendanceStatus,
        remarks: Option<&str>,
    ) -> Result<OpResult<AttendanceRecord>, EngineError> {
        let record = store::update_attendance(&self.conn, id, status, remarks)?.ok_or(
            EngineError::NotFound {
                entity: "attendance record",
                id,
            },
        )?;

        info!(attendance_id = id, status = %status, "attendance updated");
        Ok(OpResult::ok("Attendance record updated successfully", record))
    }

    pub fn delete_attendance(&self, id: i64) -> OpResult<()> {
        finish(self.try_delete_attendance(id))
    }

    fn try_delete_attendance(&self, id: i64) -> Result<OpResult<()>, EngineError> {
        if !store::delete_attendance(&self.conn, id)? {
            return Err(EngineError::NotFound {
                entity: "attendance record",
                id,
            });
        }

        info!(attendance_id = id, "attendance deleted");
        Ok(OpResult::ok_empty("Attendance record deleted successfully"))
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    pub fn attendance_statistics(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> OpResult<AttendanceStats> {
        if student_id <= 0 || course_id <= 0 {
            return OpResult::from_error(&EngineError::ValidationFailed(vec![
                "Student and course IDs must be positive integers".to_string(),
            ]));
        }

        match stats::attendance_statistics(&self.conn, student_id, course_id) {
            Ok(stats) => OpResult::ok("Attendance statistics retrieved successfully", stats),
            Err(err) => finish(Err(EngineError::store(err))),
        }
    }

    pub fn course_attendance_statistics(&self, course_id: i64) -> OpResult<CourseAttendanceStats> {
        if course_id <= 0 {
            return OpResult::from_error(&EngineError::ValidationFailed(vec![
                "Course ID must be a positive integer".to_string(),
            ]));
        }

        match stats::course_attendance_statistics(&self.conn, course_id) {
            Ok(stats) => OpResult::ok("Course attendance statistics retrieved successfully", stats),
            Err(err) => finish(Err(EngineError::store(err))),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tracing_subscriber::EnvFilter;

    // Operation logs go to the test writer; RUST_LOG controls the filter
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn engine() -> Engine {
        init_tracing();
        Engine::in_memory(EngineConfig::default()).unwrap()
    }

    fn engine_with(config: EngineConfig) -> Engine {
        init_tracing();
        Engine::in_memory(config).unwrap()
    }

    fn sample_student(reg: &str) -> Student {
        Student::new(
            reg.to_string(),
            "Jane".to_string(),
            "Mwangi".to_string(),
            "jane@university.ac.ke".to_string(),
            "712-345-6789".to_string(),
            1,
            NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
        )
    }

    fn sample_course(code: &str) -> Course {
        Course::new(code.to_string(), "Intro to Programming".to_string(), 3, 1)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn setup_pair(engine: &Engine) -> (i64, i64) {
        let student = engine.register_student(sample_student("CUE/24/001"));
        let course = engine.create_course(sample_course("CS101"));
        (student.data.unwrap().id, course.data.unwrap().id)
    }

    // ------------------------------------------------------------------
    // Field validation
    // ------------------------------------------------------------------

    #[test]
    fn test_course_validation_collects_all_violations() {
        // Bad code AND bad name: both must be reported, no short-circuit
        let course = Course::new("cs1".to_string(), "ab".to_string(), 3, 1);
        let errors = validate_course(&course);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "code"));
        assert!(errors.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn test_student_validation_collects_all_violations() {
        let mut student = sample_student("bad-reg");
        student.email = "not-an-email".to_string();
        student.current_semester = 12;

        let errors = validate_student(&student);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "registration_number"));
        assert!(errors.iter().any(|e| e.field == "email"));
        assert!(errors.iter().any(|e| e.field == "current_semester"));
    }

    #[test]
    fn test_create_course_rejects_invalid_fields_in_result_shape() {
        let engine = engine();
        let result = engine.create_course(Course::new("cs1".to_string(), "ab".to_string(), 0, 9));

        assert!(!result.success);
        assert_eq!(result.message, "Validation failed");
        assert!(result.data.is_none());
        assert_eq!(result.errors.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn test_duplicate_course_code_rejected() {
        let engine = engine();
        assert!(engine.create_course(sample_course("CS101")).success);

        let second = engine.create_course(sample_course("CS101"));
        assert!(!second.success);
        assert!(second.message.contains("already exists"));
    }

    #[test]
    fn test_duplicate_registration_number_rejected() {
        let engine = engine();
        assert!(engine.register_student(sample_student("CUE/24/001")).success);

        let second = engine.register_student(sample_student("CUE/24/001"));
        assert!(!second.success);
    }

    // ------------------------------------------------------------------
    // Enrollment lifecycle
    // ------------------------------------------------------------------

    #[test]
    fn test_create_enrollment_assigns_identity_and_enrolled_status() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let result = engine.create_enrollment(Enrollment::new(student_id, course_id, date()));
        assert!(result.success);

        let enrollment = result.data.unwrap();
        assert!(enrollment.id > 0);
        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
    }

    #[test]
    fn test_create_enrollment_honors_pending_request() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let candidate = Enrollment::with_status(
            student_id,
            course_id,
            date(),
            EnrollmentStatus::Pending,
        );
        let result = engine.create_enrollment(candidate);
        assert_eq!(result.data.unwrap().status, EnrollmentStatus::Pending);
    }

    #[test]
    fn test_second_enrollment_rejected_while_first_active() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        assert!(engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .success);

        let second = engine.create_enrollment(Enrollment::new(student_id, course_id, date()));
        assert!(!second.success);
        assert!(second.message.contains("already enrolled"));
    }

    #[test]
    fn test_completed_course_cannot_be_retaken() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .data
            .unwrap()
            .id;
        assert!(engine
            .update_enrollment_status(id, EnrollmentStatus::Completed)
            .success);

        let retake = engine.create_enrollment(Enrollment::new(student_id, course_id, date()));
        assert!(!retake.success);
        assert!(retake.message.contains("already completed"));
    }

    #[test]
    fn test_validation_errors_reported_before_eligibility() {
        let mut engine = engine();

        // Unknown student AND invalid date: the date violation must win
        let future = chrono::Utc::now().date_naive() + chrono::Duration::days(30);
        let result = engine.create_enrollment(Enrollment::new(999, 999, future));

        assert!(!result.success);
        assert_eq!(result.message, "Validation failed");
        assert!(result
            .errors
            .unwrap()
            .iter()
            .any(|e| e.contains("future")));
    }

    #[test]
    fn test_unknown_references_rejected_by_eligibility() {
        let mut engine = engine();
        let result = engine.create_enrollment(Enrollment::new(999, 998, date()));
        assert!(!result.success);
        assert!(result.message.contains("student with ID 999 not found"));
    }

    #[test]
    fn test_lifecycle_scenario_withdraw_reenroll_then_invalid_complete() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .data
            .unwrap()
            .id;

        // ENROLLED -> WITHDRAWN -> ENROLLED is the re-enrollment path
        assert!(engine
            .update_enrollment_status(id, EnrollmentStatus::Withdrawn)
            .success);
        assert!(engine
            .update_enrollment_status(id, EnrollmentStatus::Enrolled)
            .success);

        // Back to WITHDRAWN, then straight to COMPLETED is invalid
        assert!(engine
            .update_enrollment_status(id, EnrollmentStatus::Withdrawn)
            .success);
        let invalid = engine.update_enrollment_status(id, EnrollmentStatus::Completed);
        assert!(!invalid.success);
        assert!(invalid.message.contains("invalid status transition"));

        // Persisted record untouched by the rejected move
        let stored = engine.enrollment(id).unwrap().unwrap();
        assert_eq!(stored.status, EnrollmentStatus::Withdrawn);
    }

    #[test]
    fn test_idempotent_status_update_succeeds() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .data
            .unwrap()
            .id;
        assert!(engine
            .update_enrollment_status(id, EnrollmentStatus::Enrolled)
            .success);
    }

    #[test]
    fn test_update_status_of_missing_enrollment_is_not_found() {
        let engine = engine();
        let result = engine.update_enrollment_status(999, EnrollmentStatus::Withdrawn);
        assert!(!result.success);
        assert!(result.message.contains("not found"));
    }

    #[test]
    fn test_capacity_rejects_then_admits_after_withdrawal() {
        let mut engine = engine_with(EngineConfig::default().with_capacity(2));
        let course_id = engine.create_course(sample_course("CS101")).data.unwrap().id;

        let mut first_id = 0;
        for i in 1..=2 {
            let student = engine
                .register_student(sample_student(&format!("CUE/24/{i:03}")))
                .data
                .unwrap();
            let result = engine.create_enrollment(Enrollment::new(student.id, course_id, date()));
            assert!(result.success);
            if i == 1 {
                first_id = result.data.unwrap().id;
            }
        }

        let late = engine
            .register_student(sample_student("CUE/24/999"))
            .data
            .unwrap();
        let rejected = engine.create_enrollment(Enrollment::new(late.id, course_id, date()));
        assert!(!rejected.success);
        assert!(rejected.message.contains("capacity"));

        // Freeing a seat admits the waiting student
        assert!(engine
            .update_enrollment_status(first_id, EnrollmentStatus::Withdrawn)
            .success);
        assert!(engine
            .create_enrollment(Enrollment::new(late.id, course_id, date()))
            .success);
    }

    #[test]
    fn test_delete_blocked_for_terminal_when_protected() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .data
            .unwrap()
            .id;
        engine.update_enrollment_status(id, EnrollmentStatus::Completed);

        let blocked = engine.delete_enrollment(id);
        assert!(!blocked.success);
        assert!(blocked.message.contains("protected"));
        assert!(engine.enrollment(id).unwrap().is_some());
    }

    #[test]
    fn test_delete_allowed_when_protection_disabled() {
        let mut engine =
            engine_with(EngineConfig::default().with_terminal_protection(false));
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .data
            .unwrap()
            .id;
        engine.update_enrollment_status(id, EnrollmentStatus::Completed);

        assert!(engine.delete_enrollment(id).success);
        assert!(engine.enrollment(id).unwrap().is_none());
    }

    #[test]
    fn test_delete_non_terminal_always_allowed() {
        let mut engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .create_enrollment(Enrollment::new(student_id, course_id, date()))
            .data
            .unwrap()
            .id;
        assert!(engine.delete_enrollment(id).success);
    }

    // ------------------------------------------------------------------
    // Attendance + statistics
    // ------------------------------------------------------------------

    #[test]
    fn test_duplicate_attendance_key_rejected_not_overwritten() {
        let engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let record = AttendanceRecord::new(
            student_id,
            course_id,
            date(),
            AttendanceStatus::Present,
            None,
        );
        assert!(engine.mark_attendance(record).success);

        let duplicate = AttendanceRecord::new(
            student_id,
            course_id,
            date(),
            AttendanceStatus::Absent,
            None,
        );
        let result = engine.mark_attendance(duplicate);
        assert!(!result.success);
        assert!(result.message.contains("already recorded"));

        // The original PRESENT row survived
        let stats = engine.attendance_statistics(student_id, course_id);
        let stats = stats.data.unwrap();
        assert_eq!(stats.present, 1);
        assert_eq!(stats.absent, 0);
    }

    #[test]
    fn test_attendance_for_unknown_references_is_not_a_duplicate() {
        let engine = engine();

        // No students or courses exist; the foreign-key failure must come
        // back as a store error, never as the duplicate-key rejection
        let record = AttendanceRecord::new(
            12345,
            67890,
            date(),
            AttendanceStatus::Present,
            None,
        );
        let result = engine.mark_attendance(record);

        assert!(!result.success);
        assert!(!result.message.contains("already recorded"));
        assert!(result.message.contains("store failure"));
    }

    #[test]
    fn test_attendance_update_and_delete() {
        let engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let id = engine
            .mark_attendance(AttendanceRecord::new(
                student_id,
                course_id,
                date(),
                AttendanceStatus::Absent,
                None,
            ))
            .data
            .unwrap()
            .id;

        let updated = engine.update_attendance(id, AttendanceStatus::Excused, Some("sick note"));
        assert!(updated.success);
        assert_eq!(updated.data.unwrap().status, AttendanceStatus::Excused);

        assert!(engine.delete_attendance(id).success);
        assert!(!engine.delete_attendance(id).success);
    }

    #[test]
    fn test_statistics_through_engine() {
        let engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        for day in 1..=8 {
            let d = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            engine.mark_attendance(AttendanceRecord::new(
                student_id,
                course_id,
                d,
                AttendanceStatus::Present,
                None,
            ));
        }
        for day in 9..=10 {
            let d = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            engine.mark_attendance(AttendanceRecord::new(
                student_id,
                course_id,
                d,
                AttendanceStatus::Late,
                None,
            ));
        }

        let result = engine.attendance_statistics(student_id, course_id);
        assert!(result.success);
        let stats = result.data.unwrap();
        assert_eq!(stats.total, 10);
        assert_eq!(stats.attendance_rate, 100.0);

        let course_stats = engine.course_attendance_statistics(course_id).data.unwrap();
        assert_eq!(course_stats.unique_students, 1);
    }

    #[test]
    fn test_statistics_reject_non_positive_ids() {
        let engine = engine();
        assert!(!engine.attendance_statistics(0, 1).success);
        assert!(!engine.course_attendance_statistics(-1).success);
    }

    #[test]
    fn test_result_shape_serializes_for_api_consumers() {
        let engine = engine();
        let result = engine.create_course(sample_course("CS101"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["code"], "CS101");
        assert!(json["errors"].is_null());

        let failed = engine.create_course(sample_course("CS101"));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_eligibility_probe_matches_create_path() {
        let engine = engine();
        let (student_id, course_id) = setup_pair(&engine);

        let ok = engine.check_eligibility(student_id, course_id);
        assert!(ok.success);

        let unknown = engine.check_eligibility(999, course_id);
        assert!(!unknown.success);
    }
}
