// Enrollment Engine - Core Library
// Exposes all modules for use in CLI frontends, services, and tests

pub mod config;
pub mod display;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod models;
pub mod stats;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::EngineConfig;
pub use display::{attendance_status_label, enrollment_status_label};
pub use eligibility::EligibilityValidator;
pub use engine::{
    validate_course, validate_enrollment, validate_student, Engine, FieldError, OpResult,
};
pub use error::EngineError;
pub use models::{
    AttendanceRecord, AttendanceStatus, Course, Enrollment, EnrollmentStatus, Student,
};
pub use stats::{
    attendance_statistics, course_attendance_statistics, enrollment_status_counts,
    total_active_enrollments, AttendanceStats, CourseAttendanceStats,
};
pub use store::{setup_schema, CourseCatalog, StudentDirectory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
