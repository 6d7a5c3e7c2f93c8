//! Recurrence expansion.
//!
//! Turns habits, routines and dated events into [`TriggerSpec`]s. Repeating
//! specs are wall-clock rules (the notification backend repeats them); one-off
//! specs carry a concrete instant that is always strictly after the `now`
//! they were computed for.

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::date_key::{at_time, DayKey, TimeOfDay};
use crate::model::{Cadence, EventKind, Recurrence, RecurringItem, Routine, ScheduledEvent};
use crate::storage::Config;

/// How far ahead [`TriggerSpec::next_fire`] searches for a monthly day that
/// exists (e.g. the 31st).
const MONTHLY_SEARCH_MONTHS: u32 = 12;

/// When a notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Fire once.
    At { instant: DateTime<Utc> },
    /// Every day at a wall-clock time, no end.
    Daily { hour: u32, minute: u32 },
    /// Every week on `weekday`.
    Weekly { weekday: Weekday, hour: u32, minute: u32 },
    /// Every month on `day`.
    Monthly { day: u32, hour: u32, minute: u32 },
}

impl TriggerSpec {
    fn time(&self) -> Option<TimeOfDay> {
        match *self {
            TriggerSpec::At { .. } => None,
            TriggerSpec::Daily { hour, minute }
            | TriggerSpec::Weekly { hour, minute, .. }
            | TriggerSpec::Monthly { hour, minute, .. } => TimeOfDay::new(hour, minute),
        }
    }

    /// Next firing strictly after `now`, with wall-clock rules evaluated in
    /// `offset`. `None` for a one-off trigger that already passed.
    pub fn next_fire(&self, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let today = DayKey::from_instant(now, offset);
        match *self {
            TriggerSpec::At { instant } => (instant > now).then_some(instant),
            TriggerSpec::Daily { .. } => {
                let time = self.time()?;
                (0..=1)
                    .filter_map(|ahead| shift(today, ahead))
                    .filter_map(|day| at_time(day, time, offset))
                    .find(|instant| *instant > now)
            }
            TriggerSpec::Weekly { weekday, .. } => {
                let time = self.time()?;
                (0..=7)
                    .filter_map(|ahead| shift(today, ahead))
                    .filter(|day| day.weekday() == weekday)
                    .filter_map(|day| at_time(day, time, offset))
                    .find(|instant| *instant > now)
            }
            TriggerSpec::Monthly { day, .. } => {
                let time = self.time()?;
                let first = NaiveDate::from_ymd_opt(today.date().year(), today.date().month(), 1)?;
                (0..=MONTHLY_SEARCH_MONTHS)
                    .filter_map(|ahead| first.checked_add_months(Months::new(ahead)))
                    .filter_map(|month| NaiveDate::from_ymd_opt(month.year(), month.month(), day))
                    .filter_map(|date| at_time(DayKey::new(date), time, offset))
                    .find(|instant| *instant > now)
            }
        }
    }

    pub fn is_repeating(&self) -> bool {
        !matches!(self, TriggerSpec::At { .. })
    }
}

fn shift(day: DayKey, ahead: u64) -> Option<DayKey> {
    day.date().checked_add_days(Days::new(ahead)).map(DayKey::new)
}

/// Map a three-letter weekday code (case-insensitive) to a weekday.
pub fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code.trim().to_ascii_lowercase().as_str() {
        "sun" => Some(Weekday::Sun),
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Three-letter code for a weekday, as stored in recurrence day lists.
pub fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Which nudge a one-off trigger represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Nudge {
    DayBefore,
    DueSoon,
    AtDue,
}

impl Nudge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Nudge::DayBefore => "day-before",
            Nudge::DueSoon => "due-soon",
            Nudge::AtDue => "at-due",
        }
    }
}

/// Upper bound for configured reminder lead times (one year).
const MAX_LEAD_MINUTES: i64 = 366 * 24 * 60;

fn lead_time(duration: Option<Duration>) -> Duration {
    duration.unwrap_or_else(Duration::zero)
}

/// Expands recurrence rules using the configured reminder defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceResolver {
    pub fallback_time: TimeOfDay,
    pub day_before: Duration,
    pub due_soon: Duration,
    pub offset: FixedOffset,
}

impl Default for RecurrenceResolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RecurrenceResolver {
    pub fn from_config(config: &Config) -> Self {
        let reminders = &config.reminders;
        let fallback_time = TimeOfDay::new(reminders.fallback_hour, reminders.fallback_minute)
            .unwrap_or(TimeOfDay { hour: 9, minute: 0 });
        Self {
            fallback_time,
            day_before: lead_time(Duration::try_hours(
                reminders.day_before_hours.clamp(0, MAX_LEAD_MINUTES / 60),
            )),
            due_soon: lead_time(Duration::try_minutes(
                reminders.due_soon_minutes.clamp(0, MAX_LEAD_MINUTES),
            )),
            offset: config.offset(),
        }
    }

    /// Due instant of an event, or `None` when it has no usable date.
    pub fn due_instant(&self, event: &ScheduledEvent) -> Option<DateTime<Utc>> {
        event.due_instant(self.fallback_time.hour, self.fallback_time.minute, self.offset)
    }

    /// One-off triggers for a task or reminder.
    ///
    /// Tasks get a day-before and a due-soon nudge, reminders fire at the
    /// due instant. Instants at or before `now` are dropped, not clamped.
    pub fn event_triggers(&self, event: &ScheduledEvent, now: DateTime<Utc>) -> Vec<(Nudge, DateTime<Utc>)> {
        if event.completed {
            return Vec::new();
        }
        let Some(due) = self.due_instant(event) else {
            tracing::debug!(event = %event.id, "no usable due date, nothing to schedule");
            return Vec::new();
        };

        let candidates = match event.kind {
            EventKind::Task => vec![
                (Nudge::DayBefore, due.checked_sub_signed(self.day_before)),
                (Nudge::DueSoon, due.checked_sub_signed(self.due_soon)),
            ],
            EventKind::Reminder => vec![(Nudge::AtDue, Some(due))],
        };
        candidates
            .into_iter()
            .filter_map(|(nudge, instant)| instant.map(|instant| (nudge, instant)))
            .filter(|(_, instant)| *instant > now)
            .collect()
    }

    /// Repeating triggers for a habit.
    pub fn habit_triggers(&self, item: &RecurringItem) -> Vec<TriggerSpec> {
        let time = self.time_or_fallback(item.reminder_time.as_deref());
        self.recurring_specs(&item.recurrence, time, &item.id)
    }

    /// Repeating triggers for a routine. A routine without days runs daily.
    pub fn routine_triggers(&self, routine: &Routine) -> Vec<TriggerSpec> {
        let time = self.time_or_fallback(routine.time.as_deref());
        let recurrence = if routine.days.is_empty() {
            Recurrence::daily()
        } else {
            Recurrence::weekly(routine.days.iter().cloned())
        };
        self.recurring_specs(&recurrence, time, &routine.id)
    }

    fn time_or_fallback(&self, time: Option<&str>) -> TimeOfDay {
        time.and_then(TimeOfDay::parse).unwrap_or(self.fallback_time)
    }

    fn recurring_specs(&self, recurrence: &Recurrence, time: TimeOfDay, owner: &str) -> Vec<TriggerSpec> {
        let TimeOfDay { hour, minute } = time;
        match recurrence.cadence {
            Cadence::Daily => vec![TriggerSpec::Daily { hour, minute }],
            Cadence::Weekly => {
                let mut weekdays: Vec<Weekday> = Vec::new();
                for code in &recurrence.days {
                    match weekday_from_code(code) {
                        Some(day) if !weekdays.contains(&day) => weekdays.push(day),
                        Some(_) => {}
                        None => tracing::debug!(owner, code = %code, "skipping unknown weekday code"),
                    }
                }
                if weekdays.len() == 7 {
                    return vec![TriggerSpec::Daily { hour, minute }];
                }
                weekdays
                    .into_iter()
                    .map(|weekday| TriggerSpec::Weekly { weekday, hour, minute })
                    .collect()
            }
            Cadence::Monthly => match recurrence.day_of_month {
                Some(day) if (1..=31).contains(&day) => vec![TriggerSpec::Monthly { day, hour, minute }],
                other => {
                    tracing::debug!(owner, day = ?other, "monthly recurrence without a valid day");
                    Vec::new()
                }
            },
        }
    }

    /// Next concrete instants of a set of specs after `now`, ascending.
    pub fn next_instants(&self, specs: &[TriggerSpec], now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut instants: Vec<_> = specs
            .iter()
            .filter_map(|spec| spec.next_fire(now, self.offset))
            .collect();
        instants.sort();
        instants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::offset_from_minutes;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn resolver() -> RecurrenceResolver {
        RecurrenceResolver::default()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn habit(recurrence: Recurrence, time: Option<&str>) -> RecurringItem {
        RecurringItem::new("Run", "fitness", recurrence, time).unwrap()
    }

    #[test]
    fn weekday_codes_are_total_and_case_insensitive() {
        let codes = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        let mapped: Vec<Weekday> = codes.iter().filter_map(|c| weekday_from_code(c)).collect();
        assert_eq!(mapped.len(), 7);
        for day in &mapped {
            assert_eq!(weekday_from_code(weekday_code(*day)), Some(*day));
        }
        assert_eq!(weekday_from_code("tHU"), Some(Weekday::Thu));
        assert_eq!(weekday_from_code("Thursday"), None);
        assert_eq!(weekday_from_code("Xyz"), None);
    }

    #[test]
    fn task_gets_day_before_and_due_soon() {
        let task = ScheduledEvent::new(EventKind::Task, "Report", Some("2024-06-10"), Some("15:00")).unwrap();
        let triggers = resolver().event_triggers(&task, utc(2024, 6, 1, 0, 0));
        assert_eq!(
            triggers,
            vec![
                (Nudge::DayBefore, utc(2024, 6, 9, 15, 0)),
                (Nudge::DueSoon, utc(2024, 6, 10, 14, 30)),
            ]
        );
    }

    #[test]
    fn past_nudges_are_dropped_not_clamped() {
        let task = ScheduledEvent::new(EventKind::Task, "Report", Some("2024-06-10"), Some("15:00")).unwrap();
        let triggers = resolver().event_triggers(&task, utc(2024, 6, 10, 12, 0));
        assert_eq!(triggers, vec![(Nudge::DueSoon, utc(2024, 6, 10, 14, 30))]);

        let triggers = resolver().event_triggers(&task, utc(2024, 6, 10, 14, 30));
        assert!(triggers.is_empty());
    }

    #[test]
    fn oversized_lead_times_are_clamped() {
        let mut config = Config::default();
        config.set_value("reminders.day_before_hours", "100000000000").unwrap();
        config.set_value("reminders.due_soon_minutes", &i64::MAX.to_string()).unwrap();
        let resolver = RecurrenceResolver::from_config(&config);
        assert_eq!(resolver.day_before, Duration::days(366));
        assert_eq!(resolver.due_soon, Duration::days(366));

        let task = ScheduledEvent::new(EventKind::Task, "Report", Some("2024-06-10"), Some("15:00")).unwrap();
        let triggers = resolver.event_triggers(&task, utc(2023, 1, 1, 0, 0));
        assert_eq!(triggers.len(), 2);

        config.set_value("reminders.due_soon_minutes", "-5").unwrap();
        assert_eq!(RecurrenceResolver::from_config(&config).due_soon, Duration::zero());
    }

    #[test]
    fn nudges_before_the_representable_range_are_dropped() {
        let resolver = RecurrenceResolver {
            day_before: Duration::try_days(1_000_000_000).unwrap(),
            ..RecurrenceResolver::default()
        };
        let task = ScheduledEvent::new(EventKind::Task, "Report", Some("2024-06-10"), Some("15:00")).unwrap();
        let triggers = resolver.event_triggers(&task, utc(2024, 6, 1, 0, 0));
        assert_eq!(triggers, vec![(Nudge::DueSoon, utc(2024, 6, 10, 14, 30))]);
    }

    #[test]
    fn completed_or_undated_events_yield_nothing() {
        let mut task = ScheduledEvent::new(EventKind::Task, "Report", Some("2024-06-10"), None).unwrap();
        task.completed = true;
        assert!(resolver().event_triggers(&task, utc(2024, 6, 1, 0, 0)).is_empty());

        let undated = ScheduledEvent::new(EventKind::Task, "Someday", None, None).unwrap();
        assert!(resolver().event_triggers(&undated, utc(2024, 6, 1, 0, 0)).is_empty());
    }

    #[test]
    fn reminder_fires_at_due_with_fallback_time() {
        let reminder = ScheduledEvent::new(EventKind::Reminder, "Call mom", Some("2024-06-10"), None).unwrap();
        let triggers = resolver().event_triggers(&reminder, utc(2024, 6, 1, 0, 0));
        assert_eq!(triggers, vec![(Nudge::AtDue, utc(2024, 6, 10, 9, 0))]);
    }

    #[test]
    fn daily_or_all_weekdays_collapse_to_one_daily_spec() {
        let daily = habit(Recurrence::daily(), Some("07:15"));
        assert_eq!(
            resolver().habit_triggers(&daily),
            vec![TriggerSpec::Daily { hour: 7, minute: 15 }]
        );

        let every_day = habit(
            Recurrence::weekly(["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]),
            None,
        );
        assert_eq!(
            resolver().habit_triggers(&every_day),
            vec![TriggerSpec::Daily { hour: 9, minute: 0 }]
        );
    }

    #[test]
    fn weekly_subset_gets_one_spec_per_weekday_and_skips_bad_codes() {
        let item = habit(Recurrence::weekly(["Mon", "bogus", "Fri", "mon"]), Some("18:00"));
        assert_eq!(
            resolver().habit_triggers(&item),
            vec![
                TriggerSpec::Weekly { weekday: Weekday::Mon, hour: 18, minute: 0 },
                TriggerSpec::Weekly { weekday: Weekday::Fri, hour: 18, minute: 0 },
            ]
        );
    }

    #[test]
    fn monthly_yields_single_spec() {
        let item = habit(Recurrence::monthly(15), None);
        assert_eq!(
            resolver().habit_triggers(&item),
            vec![TriggerSpec::Monthly { day: 15, hour: 9, minute: 0 }]
        );
    }

    #[test]
    fn routines_without_days_run_daily() {
        let routine = Routine::new("Evening", Some("21:00"), vec![]).unwrap();
        assert_eq!(
            resolver().routine_triggers(&routine),
            vec![TriggerSpec::Daily { hour: 21, minute: 0 }]
        );
        let weekdays = Routine::new("Work prep", Some("08:00"), vec!["Mon".into(), "Tue".into()]).unwrap();
        assert_eq!(resolver().routine_triggers(&weekdays).len(), 2);
    }

    #[test]
    fn next_fire_for_repeating_specs() {
        // 2024-06-05 is a Wednesday.
        let now = utc(2024, 6, 5, 10, 0);
        let offset = offset_from_minutes(0);

        let daily = TriggerSpec::Daily { hour: 9, minute: 0 };
        assert_eq!(daily.next_fire(now, offset), Some(utc(2024, 6, 6, 9, 0)));

        let later_today = TriggerSpec::Daily { hour: 11, minute: 0 };
        assert_eq!(later_today.next_fire(now, offset), Some(utc(2024, 6, 5, 11, 0)));

        let wednesday = TriggerSpec::Weekly { weekday: Weekday::Wed, hour: 9, minute: 0 };
        assert_eq!(wednesday.next_fire(now, offset), Some(utc(2024, 6, 12, 9, 0)));

        let monthly = TriggerSpec::Monthly { day: 31, hour: 9, minute: 0 };
        assert_eq!(monthly.next_fire(now, offset), Some(utc(2024, 7, 31, 9, 0)));
    }

    #[test]
    fn next_fire_respects_offset() {
        let now = utc(2024, 6, 5, 10, 0);
        let plus_two = offset_from_minutes(120);
        let daily = TriggerSpec::Daily { hour: 9, minute: 0 };
        // 09:00 at +02:00 is 07:00 UTC, already past today.
        assert_eq!(daily.next_fire(now, plus_two), Some(utc(2024, 6, 6, 7, 0)));
    }

    #[test]
    fn trigger_spec_serializes_tagged() {
        let spec = TriggerSpec::Weekly { weekday: Weekday::Mon, hour: 8, minute: 0 };
        let json = serde_json::to_value(spec).unwrap();
        assert_eq!(json["type"], "weekly");
        assert_eq!(json["weekday"], "Mon");
    }

    proptest! {
        #[test]
        fn never_yields_past_instants(
            day_offset in 0i64..60,
            hour in 0u32..24,
            minute in 0u32..60,
            now_offset_minutes in 0i64..(60 * 24 * 60),
            reminder in any::<bool>(),
        ) {
            let due_day = DayKey::from_ymd(2024, 1, 1).unwrap().date() + Duration::days(day_offset);
            let kind = if reminder { EventKind::Reminder } else { EventKind::Task };
            let event = ScheduledEvent::new(
                kind,
                "Prop",
                Some(due_day.to_string().as_str()),
                Some(format!("{hour:02}:{minute:02}").as_str()),
            ).unwrap();
            let now = utc(2024, 1, 1, 0, 0) + Duration::minutes(now_offset_minutes);
            let resolver = resolver();

            for (_, instant) in resolver.event_triggers(&event, now) {
                prop_assert!(instant > now);
            }

            let specs = [
                TriggerSpec::Daily { hour, minute },
                TriggerSpec::Weekly { weekday: Weekday::Sat, hour, minute },
                TriggerSpec::Monthly { day: 1 + (minute % 31), hour, minute },
            ];
            for instant in resolver.next_instants(&specs, now) {
                prop_assert!(instant > now);
            }
        }
    }
}
