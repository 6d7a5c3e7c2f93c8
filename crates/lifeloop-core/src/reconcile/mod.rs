//! Remote/local reconciliation of day-scoped food logs.
//!
//! [`merge_day`] is the pure merge; [`DayReconciler`] wraps it with per-day
//! serialization and write-through to the local cache.

mod day;

pub use day::DayReconciler;

use std::collections::HashSet;

use crate::model::{DayRecord, FoodEntry};

/// Merge remote and locally cached entries for one day.
///
/// Remote entries come first and the first occurrence of each identity wins,
/// so the remote copy of a duplicated entry is the one kept. The calorie
/// total is recomputed from the deduplicated list, except that an empty
/// result keeps `base.calories` so an empty merge before the first fetch
/// completes does not clobber a known total.
pub fn merge_day(remote: &[FoodEntry], local: &[FoodEntry], base: &DayRecord) -> DayRecord {
    let mut seen = HashSet::new();
    let foods: Vec<FoodEntry> = remote
        .iter()
        .chain(local)
        .filter(|entry| seen.insert(entry.identity()))
        .cloned()
        .collect();

    let calories = if foods.is_empty() {
        base.calories
    } else {
        foods.iter().fold(0u32, |acc, f| acc.saturating_add(f.calories))
    };

    DayRecord {
        foods,
        calories,
        ..base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::DayKey;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn day() -> DayKey {
        DayKey::from_ymd(2024, 1, 1).unwrap()
    }

    fn with_id(id: &str, name: &str, calories: u32) -> FoodEntry {
        FoodEntry {
            id: Some(id.into()),
            name: name.into(),
            calories,
            created_at: None,
            date: Some(day()),
        }
    }

    #[test]
    fn remote_and_local_duplicates_collapse() {
        let remote = vec![with_id("a", "Toast", 100)];
        let local = vec![with_id("a", "Toast", 100), with_id("b", "Egg", 50)];
        let merged = merge_day(&remote, &local, &DayRecord::new(day()));

        let ids: Vec<_> = merged.foods.iter().map(|f| f.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(merged.calories, 150);
    }

    #[test]
    fn remote_copy_wins_on_conflict() {
        let remote = vec![with_id("a", "Toast (edited)", 120)];
        let local = vec![with_id("a", "Toast", 100)];
        let merged = merge_day(&remote, &local, &DayRecord::new(day()));
        assert_eq!(merged.foods.len(), 1);
        assert_eq!(merged.foods[0].name, "Toast (edited)");
        assert_eq!(merged.calories, 120);
    }

    #[test]
    fn offline_entries_dedupe_by_created_at_then_composite() {
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let offline = FoodEntry {
            id: None,
            name: "Banana".into(),
            calories: 90,
            created_at: Some(stamp),
            date: Some(day()),
        };
        let no_stamp = FoodEntry {
            created_at: None,
            ..offline.clone()
        };
        let local = vec![offline.clone(), offline.clone(), no_stamp.clone(), no_stamp];
        let merged = merge_day(&[], &local, &DayRecord::new(day()));
        assert_eq!(merged.foods.len(), 2);
        assert_eq!(merged.calories, 180);
    }

    #[test]
    fn empty_merge_preserves_prior_total() {
        let mut base = DayRecord::new(day());
        base.calories = 640;
        base.mood = Some("good".into());
        let merged = merge_day(&[], &[], &base);
        assert_eq!(merged.calories, 640);
        assert_eq!(merged.mood.as_deref(), Some("good"));
    }

    #[test]
    fn zero_calorie_entries_override_prior_total() {
        let mut base = DayRecord::new(day());
        base.calories = 640;
        let merged = merge_day(&[with_id("w", "Water", 0)], &[], &base);
        assert_eq!(merged.calories, 0);
    }

    #[test]
    fn remerging_with_empty_local_is_a_no_op() {
        let remote = vec![with_id("a", "Toast", 100)];
        let local = vec![with_id("a", "Toast", 100), with_id("b", "Egg", 50)];
        let base = DayRecord::new(day());
        let once = merge_day(&remote, &local, &base);
        let twice = merge_day(&once.foods, &[], &base);
        assert_eq!(once, twice);
    }

    fn arb_entry() -> impl Strategy<Value = FoodEntry> {
        (
            prop::option::of("[a-d]"),
            "[a-z]{1,4}",
            0u32..2_000,
            prop::option::of(0i64..5),
        )
            .prop_map(|(id, name, calories, stamp)| FoodEntry {
                id,
                name,
                calories,
                created_at: stamp.map(|s| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(s)),
                date: Some(day()),
            })
    }

    proptest! {
        #[test]
        fn merged_total_equals_sum_of_foods(
            remote in prop::collection::vec(arb_entry(), 0..8),
            local in prop::collection::vec(arb_entry(), 0..8),
        ) {
            let merged = merge_day(&remote, &local, &DayRecord::new(day()));
            prop_assert_eq!(merged.calories, merged.food_total());
        }

        #[test]
        fn merge_is_idempotent_with_empty_local(
            remote in prop::collection::vec(arb_entry(), 0..8),
            local in prop::collection::vec(arb_entry(), 0..8),
            prior in 0u32..5_000,
        ) {
            let mut base = DayRecord::new(day());
            base.calories = prior;
            let once = merge_day(&remote, &local, &base);
            let twice = merge_day(&once.foods, &[], &base);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merged_identities_are_unique(
            remote in prop::collection::vec(arb_entry(), 0..8),
            local in prop::collection::vec(arb_entry(), 0..8),
        ) {
            let merged = merge_day(&remote, &local, &DayRecord::new(day()));
            let identities: HashSet<_> = merged.foods.iter().map(FoodEntry::identity).collect();
            prop_assert_eq!(identities.len(), merged.foods.len());
        }
    }
}
