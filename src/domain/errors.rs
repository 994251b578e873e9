//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank.
    Empty(&'static str),

    /// The provided phone number is invalid.
    InvalidPhone(String),

    /// The amount is negative or not a finite number.
    InvalidAmount(String),

    /// Hour or minute out of range.
    InvalidTime { hour: u32, minute: u32 },

    /// Text that should have been `HH:MM`.
    InvalidTimeString(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "{} cannot be empty", field),
            Self::InvalidPhone(phone) => write!(f, "Invalid phone number: {}", phone),
            Self::InvalidAmount(amount) => write!(f, "Invalid amount: {}", amount),
            Self::InvalidTime { hour, minute } => {
                write!(f, "Invalid time of day: {:02}:{:02}", hour, minute)
            }
            Self::InvalidTimeString(text) => write!(f, "Expected HH:MM, got: {}", text),
        }
    }
}

impl std::error::Error for ValidationError {}
