// ✅ Validation Utilities - pure format predicates
// Stateless building blocks consumed by field-level validation in the engine.
// No side effects, no persistence access.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Date format used everywhere records carry a date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// COMPILED PATTERNS
// ============================================================================

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[_A-Za-z0-9+-]+(\.[_A-Za-z0-9-]+)*@[A-Za-z0-9-]+(\.[A-Za-z0-9]+)*(\.[A-Za-z]{2,})$")
        .unwrap()
});

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+\d{1,3}( )?)?((\(\d{1,3}\))|\d{1,3})[- .]?\d{3,4}[- .]?\d{4}$").unwrap()
});

/// Registration numbers look like ABC/123/12345
static REGISTRATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}/\d{2,4}/\d{2,5}$").unwrap());

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+([ '-][A-Za-z]+)*$").unwrap());

/// Course codes: 2-4 uppercase letters followed by 3-4 digits (e.g. CS101)
static COURSE_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,4}\d{3,4}$").unwrap());

// ============================================================================
// FORMAT PREDICATES
// ============================================================================

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

pub fn is_valid_registration_number(reg_number: &str) -> bool {
    REGISTRATION_PATTERN.is_match(reg_number)
}

/// Names for students, lecturers, guardians: alphabetic words joined by
/// single spaces, hyphens or apostrophes.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

pub fn is_valid_course_code(code: &str) -> bool {
    COURSE_CODE_PATTERN.is_match(code)
}

/// Password strength: at least 8 characters with a digit, a lowercase
/// letter, an uppercase letter, one of @#$%^&+= and no whitespace.
/// The regex crate has no lookahead, so this scans character classes.
pub fn is_valid_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| "@#$%^&+=".contains(c))
        && !password.chars().any(|c| c.is_whitespace())
}

// ============================================================================
// DATES
// ============================================================================

/// Parse a date in the fixed yyyy-mm-dd format
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).ok()
}

pub fn is_valid_date(date_str: &str) -> bool {
    parse_date(date_str).is_some()
}

pub fn is_past_date(date_str: &str) -> bool {
    match parse_date(date_str) {
        Some(date) => date < Utc::now().date_naive(),
        None => false,
    }
}

pub fn is_future_date(date_str: &str) -> bool {
    match parse_date(date_str) {
        Some(date) => date > Utc::now().date_naive(),
        None => false,
    }
}

// ============================================================================
// GENERAL-PURPOSE CHECKS
// ============================================================================

pub fn is_not_empty(s: &str) -> bool {
    !s.trim().is_empty()
}

pub fn is_integer(s: &str) -> bool {
    is_not_empty(s) && s.trim().parse::<i64>().is_ok()
}

pub fn is_decimal(s: &str) -> bool {
    is_not_empty(s) && s.trim().parse::<f64>().is_ok()
}

pub fn is_alphabetic(s: &str) -> bool {
    is_not_empty(s) && s.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_alphanumeric(s: &str) -> bool {
    is_not_empty(s) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Grade values are percentages within an inclusive range
pub fn is_valid_grade(grade: f64, min_grade: f64, max_grade: f64) -> bool {
    grade >= min_grade && grade <= max_grade
}

// ============================================================================
// TESTS
// ============================================================================
