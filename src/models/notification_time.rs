//! Daily reminder times.

use crate::domain::ValidationError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A time of day at which the call reminder fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationTime {
    pub id: String,

    /// Hour of day (0-23, local time)
    pub hour: u32,

    /// Minute of hour (0-59)
    pub minute: u32,

    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl NotificationTime {
    /// Create an enabled reminder time with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTime` when the hour or minute is out of range.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime { hour, minute });
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            hour,
            minute,
            is_enabled: true,
        })
    }

    /// The list used when nothing has been configured: 09:00 every day.
    pub fn defaults() -> Vec<NotificationTime> {
        vec![Self {
            id: uuid::Uuid::new_v4().to_string(),
            hour: 9,
            minute: 0,
            is_enabled: true,
        }]
    }

    /// Parse `HH:MM` into an enabled reminder time.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimeString(text.to_string());
        let (h, m) = text.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse::<u32>().map_err(|_| invalid())?;
        let minute = m.parse::<u32>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }

    /// Wall-clock time of day, `None` if the stored fields are out of range.
    pub fn naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }

    /// `HH:MM`
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}
