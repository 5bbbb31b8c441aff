// 🎓 Student - immutable snapshot owned by the directory
// The engine reads students for eligibility checks and never mutates them
// outside an explicit update.

use crate::validation;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Identity assigned by the store; 0 until persisted
    pub id: i64,

    /// Registration number, format ABC/123/12345
    pub registration_number: String,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,

    /// Current semester, 1-8
    pub current_semester: u8,

    /// Date the student joined; never in the future
    pub enrollment_date: NaiveDate,
}

impl Student {
    pub fn new(
        registration_number: String,
        first_name: String,
        last_name: String,
        email: String,
        phone: String,
        current_semester: u8,
        enrollment_date: NaiveDate,
    ) -> Self {
        Student {
            id: 0,
            registration_number,
            first_name,
            last_name,
            email,
            phone,
            current_semester,
            enrollment_date,
        }
    }

    pub fn is_valid_semester(semester: u8) -> bool {
        (1..=8).contains(&semester)
    }

    pub fn is_valid_enrollment_date(date: NaiveDate) -> bool {
        date <= Utc::now().date_naive()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// All field invariants at once; the engine reports per-field errors
    /// through its collect-all validation instead of this summary.
    pub fn is_valid(&self) -> bool {
        validation::is_valid_registration_number(&self.registration_number)
            && validation::is_valid_name(&self.first_name)
            && validation::is_valid_name(&self.last_name)
            && validation::is_valid_email(&self.email)
            && validation::is_valid_phone_number(&self.phone)
            && Self::is_valid_semester(self.current_semester)
            && Self::is_valid_enrollment_date(self.enrollment_date)
    }
}
