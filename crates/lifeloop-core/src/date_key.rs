//! Canonical day keys and date/time construction.
//!
//! Every day-granularity comparison in the engine goes through [`DayKey`], a
//! proleptic Gregorian calendar date with no time or timezone component.
//! Older clients stored completion dates as locale day-strings such as
//! `"Mon Jan 01 2024"`; those parse to the same key as `"2024-01-01"`.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc, Weekday,
};
use serde::{Deserialize, Serialize};

/// Legacy locale day-string layout, e.g. `Mon Jan 01 2024`.
const LEGACY_FORMAT: &str = "%a %b %d %Y";
const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// A calendar day, independent of time of day and timezone formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Day containing `instant` as seen from `offset`.
    pub fn from_instant(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(instant.with_timezone(&offset).date_naive())
    }

    /// Parse any supported day representation.
    ///
    /// Accepted inputs: `YYYY-MM-DD`, RFC 3339 date-times (the date part as
    /// written, without shifting timezones), naive `YYYY-MM-DDTHH:MM[:SS]`
    /// and the legacy `Mon Jan 01 2024` form. Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(input, CANONICAL_FORMAT) {
            return Some(Self(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(Self(dt.date_naive()));
        }
        for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(input, layout) {
                return Some(Self(dt.date()));
            }
        }
        NaiveDate::parse_from_str(input, LEGACY_FORMAT).ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// The previous calendar day, `None` at the earliest representable date.
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    /// The next calendar day, `None` at the latest representable date.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Render in the legacy locale day-string layout.
    pub fn to_legacy_string(&self) -> String {
        self.0.format(LEGACY_FORMAT).to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unrecognized day: {s:?}"))
    }
}

impl TryFrom<String> for DayKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// An `HH:mm` wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse `HH:mm` (a trailing `:ss` is ignored). Out-of-range or
    /// non-numeric parts yield `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.trim().split(':');
        let hour = parts.next()?.trim().parse::<u32>().ok()?;
        let minute = parts.next()?.trim().parse::<u32>().ok()?;
        Self::new(hour, minute)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Fields are range-checked on construction.
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Combine a day with a wall-clock time in `offset`.
pub fn at_time(day: DayKey, time: TimeOfDay, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let naive = day.date().and_time(time.to_naive_time());
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build a concrete instant from a date input and an optional `HH:mm` time.
///
/// A missing or unparseable time falls back to `fallback_hour:fallback_minute`.
/// Returns `None` when no usable date can be read; callers treat that as
/// "do not schedule".
pub fn build_date_time(
    date_input: &str,
    time_input: Option<&str>,
    fallback_hour: u32,
    fallback_minute: u32,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let day = DayKey::parse(date_input)?;
    let time = time_input
        .and_then(TimeOfDay::parse)
        .or_else(|| TimeOfDay::new(fallback_hour, fallback_minute))?;
    at_time(day, time, offset)
}

/// Offset from a minute count, clamped to the range chrono accepts.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    let seconds = minutes.clamp(-23 * 60 - 59, 23 * 60 + 59) * 60;
    FixedOffset::east_opt(seconds).unwrap_or_else(utc_offset)
}

pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}
