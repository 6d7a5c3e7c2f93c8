//! Recurring items (habits).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{new_id, require_text};
use crate::date_key::{DayKey, TimeOfDay};
use crate::error::ValidationError;

/// How often a habit repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// Cadence plus day selector.
///
/// `days` holds three-letter weekday codes (`Mon`, `Tue`, ...) for daily and
/// weekly cadences; `day_of_month` is used by the monthly cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
}

impl Recurrence {
    pub fn daily() -> Self {
        Self::default()
    }

    pub fn weekly<I, S>(days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cadence: Cadence::Weekly,
            days: days.into_iter().map(Into::into).collect(),
            day_of_month: None,
        }
    }

    pub fn monthly(day_of_month: u32) -> Self {
        Self {
            cadence: Cadence::Monthly,
            days: Vec::new(),
            day_of_month: Some(day_of_month),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.cadence == Cadence::Monthly {
            match self.day_of_month {
                Some(day) if (1..=31).contains(&day) => {}
                other => {
                    return Err(ValidationError::InvalidValue {
                        field: "recurrence.dayOfMonth".into(),
                        message: format!("expected 1-31, got {other:?}"),
                    })
                }
            }
        }
        Ok(())
    }
}

/// A habit with its completion log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub completed_dates: BTreeSet<DayKey>,
    /// `HH:mm` reminder time; the configured fallback applies when absent.
    #[serde(default)]
    pub reminder_time: Option<String>,
}

impl RecurringItem {
    /// Create a new habit with an empty log.
    ///
    /// # Errors
    /// Returns a validation error for a blank title, an invalid monthly day
    /// or an unreadable reminder time.
    pub fn new(
        title: &str,
        category: &str,
        recurrence: Recurrence,
        reminder_time: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let title = require_text("title", title)?;
        recurrence.validate()?;
        if let Some(time) = reminder_time {
            if TimeOfDay::parse(time).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: "reminderTime".into(),
                    message: format!("expected HH:mm, got {time:?}"),
                });
            }
        }

        Ok(Self {
            id: new_id(),
            title,
            category: category.trim().to_string(),
            recurrence,
            streak: 0,
            completed_dates: BTreeSet::new(),
            reminder_time: reminder_time.map(|t| t.trim().to_string()),
        })
    }
}
