// 📋 Enrollment - lifecycle record with the authoritative transition table
// COMPLETED and FAILED are terminal; identical current/next is always a
// permitted no-op.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Enrolled,
    Pending,
    Withdrawn,
    Completed,
    Failed,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 5] = [
        EnrollmentStatus::Enrolled,
        EnrollmentStatus::Pending,
        EnrollmentStatus::Withdrawn,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Failed,
    ];

    /// Storage name, matching the `status` column values
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "ENROLLED",
            EnrollmentStatus::Pending => "PENDING",
            EnrollmentStatus::Withdrawn => "WITHDRAWN",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Failed => "FAILED",
        }
    }

    /// COMPLETED and FAILED admit no transition except to themselves
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::Failed)
    }

    /// ENROLLED and PENDING count against course capacity and block a
    /// second enrollment for the same (student, course) pair
    pub fn is_active(&self) -> bool {
        matches!(self, EnrollmentStatus::Enrolled | EnrollmentStatus::Pending)
    }

    /// The transition table. Any move not listed here is rejected and the
    /// persisted record is left unchanged.
    pub fn can_transition(current: EnrollmentStatus, next: EnrollmentStatus) -> bool {
        if current == next {
            return true; // idempotent no-op
        }

        match current {
            EnrollmentStatus::Enrolled => matches!(
                next,
                EnrollmentStatus::Completed | EnrollmentStatus::Withdrawn | EnrollmentStatus::Failed
            ),
            EnrollmentStatus::Pending => {
                matches!(next, EnrollmentStatus::Enrolled | EnrollmentStatus::Withdrawn)
            }
            // Re-enrollment is the only way out of WITHDRAWN
            EnrollmentStatus::Withdrawn => next == EnrollmentStatus::Enrolled,
            EnrollmentStatus::Completed | EnrollmentStatus::Failed => false,
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ENROLLED" => Ok(EnrollmentStatus::Enrolled),
            "PENDING" => Ok(EnrollmentStatus::Pending),
            "WITHDRAWN" => Ok(EnrollmentStatus::Withdrawn),
            "COMPLETED" => Ok(EnrollmentStatus::Completed),
            "FAILED" => Ok(EnrollmentStatus::Failed),
            other => Err(format!("unknown enrollment status: {other}")),
        }
    }
}

// ============================================================================
// ENROLLMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Identity assigned by the store; 0 until persisted
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,

    /// Required, never in the future
    pub enrollment_date: NaiveDate,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    /// New enrollment starting as ENROLLED
    pub fn new(student_id: i64, course_id: i64, enrollment_date: NaiveDate) -> Self {
        Enrollment {
            id: 0,
            student_id,
            course_id,
            enrollment_date,
            status: EnrollmentStatus::Enrolled,
        }
    }

    /// New enrollment with an explicit status (PENDING is reserved for
    /// approval workflows)
    pub fn with_status(
        student_id: i64,
        course_id: i64,
        enrollment_date: NaiveDate,
        status: EnrollmentStatus,
    ) -> Self {
        Enrollment {
            id: 0,
            student_id,
            course_id,
            enrollment_date,
            status,
        }
    }

    pub fn is_valid_student_id(student_id: i64) -> bool {
        student_id > 0
    }

    pub fn is_valid_course_id(course_id: i64) -> bool {
        course_id > 0
    }

    pub fn is_valid_enrollment_date(date: NaiveDate) -> bool {
        date <= Utc::now().date_naive()
    }

    pub fn can_withdraw(&self) -> bool {
        self.status == EnrollmentStatus::Enrolled
    }

    /// Convenience withdrawal; only succeeds from ENROLLED
    pub fn withdraw(&mut self) -> bool {
        if self.can_withdraw() {
            self.status = EnrollmentStatus::Withdrawn;
            true
        } else {
            false
        }
    }

    /// Unconditional terminal assignment; callers run the transition table
    /// before reaching for this
    pub fn complete(&mut self) {
        self.status = EnrollmentStatus::Completed;
    }

    /// Unconditional terminal assignment, see `complete`
    pub fn fail(&mut self) {
        self.status = EnrollmentStatus::Failed;
    }

    pub fn is_valid(&self) -> bool {
        Self::is_valid_student_id(self.student_id)
            && Self::is_valid_course_id(self.course_id)
            && Self::is_valid_enrollment_date(self.enrollment_date)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use EnrollmentStatus::*;

    #[test]
    fn test_no_op_transition_always_allowed() {
        for status in EnrollmentStatus::ALL {
            assert!(
                EnrollmentStatus::can_transition(status, status),
                "{status} -> {status} should be a permitted no-op"
            );
        }
    }

    #[test]
    fn test_terminal_states_admit_nothing_else() {
        for terminal in [Completed, Failed] {
            for next in EnrollmentStatus::ALL {
                if next != terminal {
                    assert!(
                        !EnrollmentStatus::can_transition(terminal, next),
                        "{terminal} -> {next} must be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn test_enrolled_transitions() {
        assert!(EnrollmentStatus::can_transition(Enrolled, Completed));
        assert!(EnrollmentStatus::can_transition(Enrolled, Withdrawn));
        assert!(EnrollmentStatus::can_transition(Enrolled, Failed));
        assert!(!EnrollmentStatus::can_transition(Enrolled, Pending));
    }

    #[test]
    fn test_pending_transitions() {
        assert!(EnrollmentStatus::can_transition(Pending, Enrolled));
        assert!(EnrollmentStatus::can_transition(Pending, Withdrawn));
        assert!(!EnrollmentStatus::can_transition(Pending, Completed));
        assert!(!EnrollmentStatus::can_transition(Pending, Failed));
    }

    #[test]
    fn test_withdrawn_allows_reenrollment_only() {
        assert!(EnrollmentStatus::can_transition(Withdrawn, Enrolled));
        assert!(!EnrollmentStatus::can_transition(Withdrawn, Completed));
        assert!(!EnrollmentStatus::can_transition(Withdrawn, Failed));
        assert!(!EnrollmentStatus::can_transition(Withdrawn, Pending));
    }

    #[test]
    fn test_active_and_terminal_classification() {
        assert!(Enrolled.is_active());
        assert!(Pending.is_active());
        assert!(!Withdrawn.is_active());
        assert!(!Completed.is_active());

        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Enrolled.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in EnrollmentStatus::ALL {
            assert_eq!(status.as_str().parse::<EnrollmentStatus>(), Ok(status));
        }
        assert!("GRADUATED".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn test_withdraw_only_from_enrolled() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let mut enrollment = Enrollment::new(1, 1, date);
        assert!(enrollment.withdraw());
        assert_eq!(enrollment.status, Withdrawn);

        // Second withdraw has nothing to do
        assert!(!enrollment.withdraw());

        let mut pending = Enrollment::with_status(1, 1, date, Pending);
        assert!(!pending.withdraw());
        assert_eq!(pending.status, Pending);
    }

    #[test]
    fn test_terminal_setters() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let mut enrollment = Enrollment::new(1, 1, date);
        enrollment.complete();
        assert_eq!(enrollment.status, Completed);

        let mut enrollment = Enrollment::new(1, 1, date);
        enrollment.fail();
        assert_eq!(enrollment.status, Failed);
    }

    #[test]
    fn test_field_invariants() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert!(Enrollment::new(1, 1, date).is_valid());
        assert!(!Enrollment::new(0, 1, date).is_valid());
        assert!(!Enrollment::new(1, -5, date).is_valid());

        let future = Utc::now().date_naive() + chrono::Duration::days(7);
        assert!(!Enrollment::new(1, 1, future).is_valid());
    }
}
