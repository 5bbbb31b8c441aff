// Entity models: field-level invariants live next to the types.

pub mod attendance;
pub mod course;
pub mod enrollment;
pub mod student;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use course::Course;
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use student::Student;
