//! Validation for library items
//!
//! Applied at the point of entry (add, edit). Items loaded wholesale from a
//! backend are not re-validated: an empty title is tolerated there.

use super::LibraryItem;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;
pub const DIFFICULTY_MIN: u8 = 1;
pub const DIFFICULTY_MAX: u8 = 5;

/// Severity of a validation error
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// A validation error or warning
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: ValidationSeverity,
}

impl ValidationError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }
}

/// The errors that kept an item out of the collection
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate an item and return errors/warnings
pub fn validate_item(item: &LibraryItem) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if item.title.trim().is_empty() {
        errors.push(ValidationError::error("title", "Title is required"));
    }

    if let Some(rating) = item.rating {
        if !rating.is_finite() || !(RATING_MIN..=RATING_MAX).contains(&rating) {
            errors.push(ValidationError::error(
                "rating",
                format!("Rating must be between {} and {}", RATING_MIN, RATING_MAX),
            ));
        }
    }

    if let Some(difficulty) = item.difficulty {
        if !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&difficulty) {
            errors.push(ValidationError::error(
                "difficulty",
                format!(
                    "Difficulty must be between {} and {}",
                    DIFFICULTY_MIN, DIFFICULTY_MAX
                ),
            ));
        }
    }

    if item.pages == Some(0) {
        errors.push(ValidationError::warning(
            "pages",
            "Page count of zero is probably a mistake",
        ));
    }

    if let Some(year) = item.publishing_year {
        if year > Utc::now().year() + 1 {
            errors.push(ValidationError::warning(
                "publishingYear",
                "Publishing year is in the future",
            ));
        }
    }

    errors
}

/// Check if an item is valid (no errors)
pub fn is_valid(item: &LibraryItem) -> bool {
    validate_item(item)
        .iter()
        .all(|e| e.severity != ValidationSeverity::Error)
}

/// Reject an item that has any error-severity findings
pub fn ensure_valid(item: &LibraryItem) -> Result<(), ValidationErrors> {
    let errors: Vec<ValidationError> = validate_item(item)
        .into_iter()
        .filter(|e| e.severity == ValidationSeverity::Error)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
