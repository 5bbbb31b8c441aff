// Error taxonomy for the enrollment engine.
// Expected failures (validation, eligibility, transitions) are recoverable
// outcomes; store failures carry the underlying message through unparsed.

use crate::models::EnrollmentStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// One or more field-level violations, all reported at once
    #[error("validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// An ENROLLED or PENDING enrollment already exists for this pair
    #[error("student {student_id} is already enrolled in course {course_id}")]
    AlreadyActive { student_id: i64, course_id: i64 },

    /// A COMPLETED enrollment exists for this pair; no retake
    #[error("student {student_id} has already completed course {course_id}")]
    AlreadyCompleted { student_id: i64, course_id: i64 },

    #[error("course {course_id} has reached its capacity of {capacity}")]
    CourseFull { course_id: i64, capacity: u32 },

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },

    /// Attendance key (student, course, date) already recorded
    #[error("attendance already recorded for student {student_id} in course {course_id} on {date}")]
    DuplicateRecord {
        student_id: i64,
        course_id: i64,
        date: String,
    },

    #[error("course code {0} already exists")]
    DuplicateCourseCode(String),

    /// Terminal-state protection policy refused the delete
    #[error("enrollment {id} is {status} and protected from deletion")]
    DeleteBlocked { id: i64, status: EnrollmentStatus },

    /// Underlying persistence error, message passed through but not parsed
    #[error("store failure: {0}")]
    Store(String),
}

impl EngineError {
    /// Collapse any persistence-layer error into the store variant
    pub fn store(err: impl std::fmt::Display) -> Self {
        EngineError::Store(err.to_string())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::store(err)
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::store(err)
    }
}
