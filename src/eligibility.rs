// 🚦 Eligibility Validator - cross-entity rules gating a new enrollment
// Evaluated as a whole: the first violation aborts the check and no
// partial side effects are applied downstream.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{self, CourseCatalog, StudentDirectory};
use rusqlite::Connection;
use tracing::debug;

pub struct EligibilityValidator {
    capacity: u32,
}

impl EligibilityValidator {
    pub fn new(capacity: u32) -> Self {
        EligibilityValidator { capacity }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.course_capacity)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Check, in order: student exists, course exists, no active or
    /// completed enrollment for the pair, course below capacity.
    ///
    /// `conn` is whatever the caller is running the surrounding operation
    /// on; passing the creation transaction here makes check-then-insert
    /// atomic.
    pub fn check(
        &self,
        directory: &dyn StudentDirectory,
        catalog: &dyn CourseCatalog,
        conn: &Connection,
        student_id: i64,
        course_id: i64,
    ) -> Result<(), EngineError> {
        if !directory.student_exists(student_id)? {
            return Err(EngineError::NotFound {
                entity: "student",
                id: student_id,
            });
        }

        if !catalog.course_exists(course_id)? {
            return Err(EngineError::NotFound {
                entity: "course",
                id: course_id,
            });
        }

        // Scan the student's history for this course
        for enrollment in store::enrollments_by_student(conn, student_id)? {
            if enrollment.course_id != course_id {
                continue;
            }

            if enrollment.status.is_active() {
                return Err(EngineError::AlreadyActive {
                    student_id,
                    course_id,
                });
            }

            if enrollment.status == crate::models::EnrollmentStatus::Completed {
                return Err(EngineError::AlreadyCompleted {
                    student_id,
                    course_id,
                });
            }
        }

        let active = store::count_active_enrollments(conn, course_id)?;
        debug!(course_id, active, capacity = self.capacity, "capacity check");
        if active >= self.capacity as i64 {
            return Err(EngineError::CourseFull {
                course_id,
                capacity: self.capacity,
            });
        }

        Ok(())
    }
}
