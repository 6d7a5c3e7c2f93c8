//! Tasks and one-off reminders.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, require_text};
use crate::date_key::{build_date_time, DayKey, TimeOfDay};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Task,
    Reminder,
}

/// A task or reminder with an optional due date and time.
///
/// Only the date/time pair is stored; the trigger instant is always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: EventKind,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl ScheduledEvent {
    /// # Errors
    /// Returns a validation error for a blank title or a date/time that
    /// cannot be read.
    pub fn new(
        kind: EventKind,
        title: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let title = require_text("title", title)?;
        if let Some(date) = date {
            if DayKey::parse(date).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: "date".into(),
                    message: format!("unrecognized date {date:?}"),
                });
            }
        }
        if let Some(time) = time {
            if TimeOfDay::parse(time).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: "time".into(),
                    message: format!("expected HH:mm, got {time:?}"),
                });
            }
        }
        Ok(Self {
            id: new_id(),
            title,
            kind,
            date: date.map(|d| d.trim().to_string()),
            time: time.map(|t| t.trim().to_string()),
            completed: false,
        })
    }

    /// Concrete due instant, or `None` when there is no usable date.
    pub fn due_instant(
        &self,
        fallback_hour: u32,
        fallback_minute: u32,
        offset: FixedOffset,
    ) -> Option<DateTime<Utc>> {
        let date = self.date.as_deref()?;
        build_date_time(date, self.time.as_deref(), fallback_hour, fallback_minute, offset)
    }
}
