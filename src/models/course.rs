// 📚 Course - catalog entry with field invariants
// Codes are 2-4 uppercase letters + 3-4 digits; names 3-100 chars;
// credits 1-6; target semester 1-8.

use crate::validation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Identity assigned by the store; 0 until persisted
    pub id: i64,

    /// Course code, e.g. CS101
    pub code: String,

    pub name: String,

    /// Credit count, 1-6
    pub credits: u8,

    /// Target semester, 1-8
    pub semester: u8,
}

impl Course {
    pub fn new(code: String, name: String, credits: u8, semester: u8) -> Self {
        Course {
            id: 0,
            code,
            name,
            credits,
            semester,
        }
    }

    pub fn is_valid_code(code: &str) -> bool {
        validation::is_valid_course_code(code)
    }

    pub fn is_valid_name(name: &str) -> bool {
        let len = name.trim().chars().count();
        (3..=100).contains(&len)
    }

    pub fn is_valid_credits(credits: u8) -> bool {
        (1..=6).contains(&credits)
    }

    pub fn is_valid_semester(semester: u8) -> bool {
        (1..=8).contains(&semester)
    }

    pub fn is_valid(&self) -> bool {
        Self::is_valid_code(&self.code)
            && Self::is_valid_name(&self.name)
            && Self::is_valid_credits(self.credits)
            && Self::is_valid_semester(self.semester)
    }
}
