// 🏷️ Display labels - human-facing names for enum values
// Storage names stay uppercase; these are what a UI or report prints.

use crate::models::{AttendanceStatus, EnrollmentStatus};

/// UI label for an enrollment status. PENDING surfaces its approval
/// semantics instead of the bare storage name.
pub fn enrollment_status_label(status: EnrollmentStatus) -> &'static str {
    match status {
        EnrollmentStatus::Enrolled => "Enrolled",
        EnrollmentStatus::Pending => "Pending Approval",
        EnrollmentStatus::Withdrawn => "Withdrawn",
        EnrollmentStatus::Completed => "Completed",
        EnrollmentStatus::Failed => "Failed",
    }
}

pub fn attendance_status_label(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "Present",
        AttendanceStatus::Absent => "Absent",
        AttendanceStatus::Late => "Late",
        AttendanceStatus::Excused => "Excused",
    }
}
