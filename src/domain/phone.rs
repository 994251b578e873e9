//! PhoneNumber value object.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Bare international or national number: optional `+`, 10 to 15 digits.
static DIGITS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+]?[0-9]{10,15}$").expect("valid phone regex"));

/// Anything that is not a digit or a leading plus.
static NON_DIALABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^+0-9]").expect("valid regex"));

/// A type-safe wrapper for phone numbers.
///
/// The number is stored exactly as entered; [`PhoneNumber::cleaned`] and
/// [`PhoneNumber::formatted`] derive dialable and display forms from it.
///
/// # Example
///
/// ```
/// use followup_tracker::domain::PhoneNumber;
///
/// let phone = PhoneNumber::new("555 123 4567").unwrap();
/// assert_eq!(phone.cleaned(), "5551234567");
/// assert_eq!(phone.formatted(), "555-123-4567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new PhoneNumber, validating the format.
    ///
    /// # Validation Rules
    ///
    /// - Must not be blank
    /// - Either matches `^[+]?[0-9]{10,15}$` once formatting is stripped, or
    ///   consists only of digits, spaces, hyphens, parentheses, plus signs and
    ///   periods with at least one digit
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPhone` if the phone format is invalid.
    pub fn new(phone: impl Into<String>) -> Result<Self, ValidationError> {
        let phone = phone.into();

        if !Self::is_valid(&phone) {
            return Err(ValidationError::InvalidPhone(phone));
        }

        Ok(Self(phone))
    }

    /// Validate phone format.
    pub fn is_valid(phone: &str) -> bool {
        if phone.trim().is_empty() {
            return false;
        }

        if DIGITS_PATTERN.is_match(&clean(phone)) {
            return true;
        }

        phone.chars().any(|c| c.is_ascii_digit())
            && phone.chars().all(|c| {
                c.is_ascii_digit()
                    || c == ' '
                    || c == '-'
                    || c == '('
                    || c == ')'
                    || c == '+'
                    || c == '.'
            })
    }

    /// Get the phone number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Digits and plus signs only, suitable for dialing.
    pub fn cleaned(&self) -> String {
        clean(&self.0)
    }

    /// Display form.
    ///
    /// 10 digits become `XXX-XXX-XXXX`, 11 digits starting with 1 become
    /// `+1 XXX-XXX-XXXX`, `+`-prefixed numbers are shown cleaned, anything
    /// else is returned as entered.
    pub fn formatted(&self) -> String {
        let cleaned = self.cleaned();
        let digits = cleaned.as_bytes();

        if digits.len() == 10 && !cleaned.starts_with('+') {
            format!("{}-{}-{}", &cleaned[0..3], &cleaned[3..6], &cleaned[6..])
        } else if digits.len() == 11 && cleaned.starts_with('1') {
            format!("+1 {}-{}-{}", &cleaned[1..4], &cleaned[4..7], &cleaned[7..])
        } else if cleaned.starts_with('+') {
            cleaned
        } else {
            self.0.clone()
        }
    }
}

fn clean(phone: &str) -> String {
    NON_DIALABLE.replace_all(phone, "").into_owned()
}

// Serde support - serialize as string
impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

// Serde support - deserialize from string with validation
impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PhoneNumber::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
