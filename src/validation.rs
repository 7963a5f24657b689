//! # Request Validation
//!
//! Field checks shared by every typed request body. Requests are rejected
//! here, before any store or engine call.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn non_empty(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(())
}

pub fn length_between(field: &str, value: &str, min: usize, max: usize) -> ValidationResult {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(ValidationError(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn positive(field: &str, value: f64) -> ValidationResult {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError(format!("{field} must be a positive number")));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> ValidationResult {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError(format!("{field} must not be negative")));
    }
    Ok(())
}

/// `value` must lie within `-max..=max`
pub fn points_within(field: &str, value: i64, max: i64) -> ValidationResult {
    if value.checked_abs().map_or(true, |abs| abs > max) {
        return Err(ValidationError(format!("{field} must be between -{max} and {max}")));
    }
    Ok(())
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

pub fn email(value: &str) -> ValidationResult {
    if !email_regex().is_match(value) {
        return Err(ValidationError::new("email must be a valid email address"));
    }
    Ok(())
}

fn month_regex() -> &'static Regex {
    static MONTH: OnceLock<Regex> = OnceLock::new();
    MONTH.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("month pattern compiles"))
}

/// Calendar month in `YYYY-MM` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::new("month must be between 01 and 12"));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for Month {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = month_regex()
            .captures(s)
            .ok_or_else(|| ValidationError::new("month must match YYYY-MM"))?;
        let year = caps[1]
            .parse()
            .map_err(|_| ValidationError::new("month must match YYYY-MM"))?;
        let month = caps[2]
            .parse()
            .map_err(|_| ValidationError::new("month must match YYYY-MM"))?;
        Month::new(year, month)
    }
}

impl TryFrom<String> for Month {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_checks() {
        assert!(non_empty("title", "  ").is_err());
        assert!(non_empty("title", "Rent").is_ok());
        assert!(length_between("name", "A", 2, 50).is_err());
        assert!(length_between("name", "Ada", 2, 50).is_ok());
        assert!(positive("amount", 0.0).is_err());
        assert!(positive("amount", f64::NAN).is_err());
        assert!(positive("amount", 12.5).is_ok());
        assert!(non_negative("progress", 0.0).is_ok());
        assert!(non_negative("progress", -1.0).is_err());
    }

    #[test]
    fn test_email() {
        assert!(email("ada@example.com").is_ok());
        assert!(email("ada@example").is_err());
        assert!(email("ada example.com").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn test_month_parsing() {
        let month: Month = "2025-06".parse().unwrap();
        assert_eq!(month.to_string(), "2025-06");
        assert!("2025-13".parse::<Month>().is_err());
        assert!("2025-6".parse::<Month>().is_err());
        assert!("June".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_contains() {
        let month: Month = "2025-06".parse().unwrap();
        assert!(month.contains(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
        assert_eq!(Month::of(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()), month);
    }

    #[test]
    fn test_month_serde_round_trip_as_string() {
        let month: Month = serde_json::from_str("\"2024-02\"").unwrap();
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2024-02\"");
        assert!(serde_json::from_str::<Month>("\"2024-2\"").is_err());
    }

    #[test]
    fn test_months_order_chronologically() {
        let a: Month = "2024-12".parse().unwrap();
        let b: Month = "2025-01".parse().unwrap();
        assert!(a < b);
    }
}
