use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{EventKind, RecurringItem, Routine, ScheduledEvent};
use crate::recurrence::{weekday_code, Nudge, RecurrenceResolver, TriggerSpec};
use crate::storage::NotificationSettings;

/// A notification to register. Derived on every pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationIntent {
    pub title: String,
    pub body: String,
    pub trigger: TriggerSpec,
    /// Correlation tag, e.g. `task:<id>:due-soon` or `habit:<id>:mon`.
    pub tag: String,
}

/// State the scheduler derives intents from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleSnapshot<'a> {
    pub habits: &'a [RecurringItem],
    pub routines: &'a [Routine],
    pub events: &'a [ScheduledEvent],
}

fn spec_suffix(spec: &TriggerSpec) -> String {
    match spec {
        TriggerSpec::Daily { .. } => "daily".to_string(),
        TriggerSpec::Weekly { weekday, .. } => weekday_code(*weekday).to_ascii_lowercase(),
        TriggerSpec::Monthly { .. } => "monthly".to_string(),
        TriggerSpec::At { .. } => "once".to_string(),
    }
}

pub fn habit_intents(resolver: &RecurrenceResolver, item: &RecurringItem) -> Vec<NotificationIntent> {
    let body = if item.streak > 0 {
        format!("Keep your {}-day streak going", item.streak)
    } else {
        "Time to check in".to_string()
    };
    resolver
        .habit_triggers(item)
        .into_iter()
        .map(|trigger| NotificationIntent {
            title: item.title.clone(),
            body: body.clone(),
            tag: format!("habit:{}:{}", item.id, spec_suffix(&trigger)),
            trigger,
        })
        .collect()
}

pub fn routine_intents(resolver: &RecurrenceResolver, routine: &Routine) -> Vec<NotificationIntent> {
    let body = match routine.tasks.len() {
        0 => "Routine starting".to_string(),
        1 => "1 step to go through".to_string(),
        n => format!("{n} steps to go through"),
    };
    resolver
        .routine_triggers(routine)
        .into_iter()
        .map(|trigger| NotificationIntent {
            title: routine.title.clone(),
            body: body.clone(),
            tag: format!("routine:{}:{}", routine.id, spec_suffix(&trigger)),
            trigger,
        })
        .collect()
}

pub fn event_intents(
    resolver: &RecurrenceResolver,
    event: &ScheduledEvent,
    now: DateTime<Utc>,
) -> Vec<NotificationIntent> {
    resolver
        .event_triggers(event, now)
        .into_iter()
        .map(|(nudge, instant)| {
            let (tag, body) = match (event.kind, nudge) {
                (EventKind::Reminder, _) => (format!("reminder:{}", event.id), "Reminder".to_string()),
                (EventKind::Task, Nudge::DayBefore) => (
                    format!("task:{}:{}", event.id, nudge.as_str()),
                    "Due tomorrow".to_string(),
                ),
                (EventKind::Task, _) => (
                    format!("task:{}:{}", event.id, nudge.as_str()),
                    format!("Due in {} minutes", resolver.due_soon.num_minutes()),
                ),
            };
            NotificationIntent {
                title: event.title.clone(),
                body,
                trigger: TriggerSpec::At { instant },
                tag,
            }
        })
        .collect()
}

/// Every intent the enabled categories produce for `snapshot` at `now`.
pub fn plan(
    resolver: &RecurrenceResolver,
    settings: &NotificationSettings,
    snapshot: &ScheduleSnapshot<'_>,
    now: DateTime<Utc>,
) -> Vec<NotificationIntent> {
    let mut intents = Vec::new();
    if settings.habits {
        intents.extend(snapshot.habits.iter().flat_map(|h| habit_intents(resolver, h)));
    }
    if settings.routines {
        intents.extend(snapshot.routines.iter().flat_map(|r| routine_intents(resolver, r)));
    }
    for event in snapshot.events {
        let enabled = match event.kind {
            EventKind::Task => settings.tasks,
            EventKind::Reminder => settings.reminders,
        };
        if enabled {
            intents.extend(event_intents(resolver, event, now));
        }
    }
    intents
}
