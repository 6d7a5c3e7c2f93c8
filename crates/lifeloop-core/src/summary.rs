//! Ledger and nutrition aggregates.
//!
//! All filters compare calendar days, never time of day. Amounts are summed
//! numerically regardless of their currency code: a ledger mixing currencies
//! produces a meaningless total, and no conversion is attempted.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::date_key::DayKey;
use crate::model::{DayRecord, EntryKind, LedgerEntry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct LedgerSummary {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

impl LedgerSummary {
    fn from_entries<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Self {
        let (income, expenses) = entries.fold((0.0, 0.0), |(income, expenses), entry| match entry.kind {
            EntryKind::Income => (income + entry.amount, expenses),
            EntryKind::Expense => (income, expenses + entry.amount),
        });
        Self {
            income,
            expenses,
            balance: income - expenses,
        }
    }
}

/// Income, expenses and balance for entries dated on `day`.
pub fn summary_for_day(ledger: &[LedgerEntry], day: DayKey) -> LedgerSummary {
    LedgerSummary::from_entries(ledger.iter().filter(|e| e.day() == Some(day)))
}

/// Same as [`summary_for_day`] over a calendar month.
pub fn summary_for_month(ledger: &[LedgerEntry], year: i32, month: u32) -> LedgerSummary {
    LedgerSummary::from_entries(ledger.iter().filter(|e| {
        e.day()
            .map(|d| d.date().year() == year && d.date().month() == month)
            .unwrap_or(false)
    }))
}

/// Expense totals per category for entries in `from..=to`.
pub fn expenses_by_category(ledger: &[LedgerEntry], from: DayKey, to: DayKey) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for entry in ledger.iter().filter(|e| e.kind == EntryKind::Expense) {
        match entry.day() {
            Some(day) if day >= from && day <= to => {
                *totals.entry(entry.category.clone()).or_insert(0.0) += entry.amount;
            }
            _ => {}
        }
    }
    totals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct NutritionTotals {
    pub calories: u32,
    pub entries: usize,
    pub water_ml: u32,
}

pub fn nutrition_totals(record: &DayRecord) -> NutritionTotals {
    NutritionTotals {
        calories: record.food_total(),
        entries: record.foods.len(),
        water_ml: record.water_ml,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FoodEntry;

    fn entry(kind: EntryKind, amount: f64, category: &str, date: &str) -> LedgerEntry {
        LedgerEntry::new(kind, amount, category, "USD", date).unwrap()
    }

    fn key(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    #[test]
    fn summary_for_day_filters_by_calendar_day() {
        let ledger = vec![
            entry(EntryKind::Income, 200.0, "salary", "2024-01-01"),
            entry(EntryKind::Expense, 50.0, "food", "2024-01-01"),
            entry(EntryKind::Expense, 10.0, "food", "2024-01-02"),
        ];
        let summary = summary_for_day(&ledger, key("2024-01-01"));
        assert_eq!(
            summary,
            LedgerSummary {
                income: 200.0,
                expenses: 50.0,
                balance: 150.0,
            }
        );
    }

    #[test]
    fn time_of_day_is_ignored() {
        let ledger = vec![
            entry(EntryKind::Expense, 5.0, "coffee", "2024-01-01T07:00:00Z"),
            entry(EntryKind::Expense, 7.0, "lunch", "2024-01-01T23:59:00+02:00"),
        ];
        assert_eq!(summary_for_day(&ledger, key("2024-01-01")).expenses, 12.0);
    }

    #[test]
    fn currencies_are_summed_without_conversion() {
        let mut euro = entry(EntryKind::Income, 100.0, "gift", "2024-01-01");
        euro.currency = "EUR".into();
        let ledger = vec![entry(EntryKind::Income, 100.0, "gift", "2024-01-01"), euro];
        assert_eq!(summary_for_day(&ledger, key("2024-01-01")).income, 200.0);
    }

    #[test]
    fn unreadable_dates_are_excluded() {
        let mut broken = entry(EntryKind::Expense, 99.0, "misc", "2024-01-01");
        broken.date = "someday".into();
        assert_eq!(summary_for_day(&[broken], key("2024-01-01")), LedgerSummary::default());
    }

    #[test]
    fn month_and_category_breakdowns() {
        let ledger = vec![
            entry(EntryKind::Income, 1000.0, "salary", "2024-02-01"),
            entry(EntryKind::Expense, 30.0, "food", "2024-02-03"),
            entry(EntryKind::Expense, 20.0, "food", "2024-02-10"),
            entry(EntryKind::Expense, 80.0, "travel", "2024-02-11"),
            entry(EntryKind::Expense, 5.0, "food", "2024-03-01"),
        ];
        let feb = summary_for_month(&ledger, 2024, 2);
        assert_eq!(feb.income, 1000.0);
        assert_eq!(feb.expenses, 130.0);
        assert_eq!(feb.balance, 870.0);

        let by_category = expenses_by_category(&ledger, key("2024-02-01"), key("2024-02-10"));
        assert_eq!(by_category.get("food"), Some(&50.0));
        assert!(!by_category.contains_key("travel"));
    }

    #[test]
    fn nutrition_totals_match_foods() {
        let mut record = DayRecord::new(key("2024-01-01"));
        record.add_food(FoodEntry {
            id: Some("a".into()),
            name: "Rice".into(),
            calories: 200,
            created_at: None,
            date: None,
        });
        record.add_water(750);
        let totals = nutrition_totals(&record);
        assert_eq!(totals.calories, 200);
        assert_eq!(totals.entries, 1);
        assert_eq!(totals.water_ml, 750);
    }
}
