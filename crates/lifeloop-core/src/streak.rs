//! Habit streak tracking.
//!
//! A habit's `streak` is a stored counter updated on every toggle using the
//! yesterday-adjacency rule:
//!
//! - completing today when yesterday is completed continues the streak (+1);
//! - completing today after a gap restarts it at 1;
//! - un-completing today decrements the stored counter by one, floored at 0,
//!   without re-deriving it from the remaining dates.
//!
//! The decrement is intentionally not a recompute, so toggling a day other
//! than the latest one can leave the counter out of step with the log.
//! [`streak_drift`] reports such items without changing them.

use serde::Serialize;

use crate::date_key::DayKey;
use crate::model::RecurringItem;

/// Toggle `today` in the habit's completion log and update the streak.
pub fn toggle_completion(item: &RecurringItem, today: DayKey) -> RecurringItem {
    let mut next = item.clone();

    if next.completed_dates.remove(&today) {
        next.streak = next.streak.saturating_sub(1);
        tracing::debug!(habit = %item.id, day = %today, streak = next.streak, "completion removed");
        return next;
    }

    next.completed_dates.insert(today);
    let continues = today.pred().is_some_and(|prev| next.completed_dates.contains(&prev));
    next.streak = if continues {
        next.streak.saturating_add(1)
    } else {
        1
    };
    tracing::debug!(habit = %item.id, day = %today, streak = next.streak, "completion added");
    next
}

pub fn is_completed_today(item: &RecurringItem, today: DayKey) -> bool {
    item.completed_dates.contains(&today)
}

/// Highest stored streak across all habits.
pub fn best_streak(items: &[RecurringItem]) -> u32 {
    items.iter().map(|item| item.streak).max().unwrap_or(0)
}

/// Length of the run of consecutive completed days ending today, or ending
/// yesterday when today is not completed yet.
pub fn derived_streak(item: &RecurringItem, today: DayKey) -> u32 {
    let mut cursor = if item.completed_dates.contains(&today) {
        Some(today)
    } else {
        today.pred()
    };

    let mut run = 0u32;
    while let Some(day) = cursor.filter(|day| item.completed_dates.contains(day)) {
        run += 1;
        cursor = day.pred();
    }
    run
}

/// A habit whose stored counter disagrees with its completion log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakDrift {
    pub habit_id: String,
    pub title: String,
    pub stored: u32,
    pub derived: u32,
}

/// Habits whose stored streak differs from [`derived_streak`].
pub fn streak_drift(items: &[RecurringItem], today: DayKey) -> Vec<StreakDrift> {
    items
        .iter()
        .filter_map(|item| {
            let derived = derived_streak(item, today);
            (derived != item.streak).then(|| StreakDrift {
                habit_id: item.id.clone(),
                title: item.title.clone(),
                stored: item.streak,
                derived,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Recurrence;

    fn habit(completed: &[&str], streak: u32) -> RecurringItem {
        let mut item = RecurringItem::new("Meditate", "mind", Recurrence::daily(), None).unwrap();
        item.completed_dates = completed.iter().map(|d| DayKey::parse(d).unwrap()).collect();
        item.streak = streak;
        item
    }

    fn key(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    #[test]
    fn adjacent_day_continues_streak() {
        let item = habit(&["Mon Jan 01 2024"], 1);
        let next = toggle_completion(&item, key("Tue Jan 02 2024"));
        assert_eq!(next.streak, 2);
        assert!(next.completed_dates.contains(&key("2024-01-01")));
        assert!(next.completed_dates.contains(&key("2024-01-02")));
    }

    #[test]
    fn gap_restarts_at_one() {
        let item = habit(&["2024-01-01", "2024-01-02", "2024-01-03"], 3);
        let next = toggle_completion(&item, key("2024-01-05"));
        assert_eq!(next.streak, 1);
    }

    #[test]
    fn first_completion_starts_at_one() {
        let item = habit(&[], 0);
        let next = toggle_completion(&item, key("2024-01-05"));
        assert_eq!(next.streak, 1);
        assert!(is_completed_today(&next, key("2024-01-05")));
    }

    #[test]
    fn uncomplete_decrements_and_floors_at_zero() {
        let item = habit(&["2024-01-05"], 0);
        let next = toggle_completion(&item, key("2024-01-05"));
        assert_eq!(next.streak, 0);
        assert!(!is_completed_today(&next, key("2024-01-05")));
    }

    #[test]
    fn complete_then_uncomplete_restores_continued_streak() {
        let item = habit(&["2024-01-03", "2024-01-04"], 2);
        let on = toggle_completion(&item, key("2024-01-05"));
        let off = toggle_completion(&on, key("2024-01-05"));
        assert_eq!(on.streak, 3);
        assert_eq!(off.streak, 2);
        assert_eq!(off.completed_dates, item.completed_dates);
    }

    #[test]
    fn decrement_does_not_recompute_from_remaining_dates() {
        // Un-completing an older day still just subtracts one from the counter.
        let item = habit(&["2024-01-01", "2024-01-02", "2024-01-03"], 3);
        let next = toggle_completion(&item, key("2024-01-01"));
        assert_eq!(next.streak, 2);
        assert_eq!(derived_streak(&next, key("2024-01-03")), 2);

        // After a restart-then-undo the counter no longer matches the log.
        let item = habit(&["2024-01-01", "2024-01-02"], 2);
        let restarted = toggle_completion(&item, key("2024-01-04"));
        let undone = toggle_completion(&restarted, key("2024-01-04"));
        assert_eq!(undone.streak, 0);
        assert_eq!(derived_streak(&undone, key("2024-01-03")), 2);
    }

    #[test]
    fn best_streak_is_running_maximum() {
        let items = vec![habit(&[], 4), habit(&[], 9), habit(&[], 2)];
        assert_eq!(best_streak(&items), 9);
        assert_eq!(best_streak(&[]), 0);
    }

    #[test]
    fn derived_streak_counts_back_from_today_or_yesterday() {
        let item = habit(&["2024-01-01", "2024-01-02", "2024-01-03"], 3);
        assert_eq!(derived_streak(&item, key("2024-01-03")), 3);
        assert_eq!(derived_streak(&item, key("2024-01-04")), 3);
        assert_eq!(derived_streak(&item, key("2024-01-05")), 0);
    }

    #[test]
    fn drift_reports_mismatched_counters() {
        let ok = habit(&["2024-01-02", "2024-01-03"], 2);
        let drifted = habit(&["2024-01-02", "2024-01-03"], 7);
        let drift = streak_drift(&[ok, drifted.clone()], key("2024-01-03"));
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].habit_id, drifted.id);
        assert_eq!(drift[0].stored, 7);
        assert_eq!(drift[0].derived, 2);
    }

    #[test]
    fn walks_stop_at_earliest_date() {
        let first = DayKey::new(chrono::NaiveDate::MIN);
        let mut item = habit(&[], 0);
        item.completed_dates.insert(first);
        assert_eq!(derived_streak(&item, first), 1);

        let fresh = toggle_completion(&habit(&[], 0), first);
        assert_eq!(fresh.streak, 1);
        assert_eq!(derived_streak(&habit(&[], 0), first), 0);
    }
}
