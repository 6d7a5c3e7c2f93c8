//! Per-day reconciliation with cache write-through.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use super::merge_day;
use crate::cache::{load_json_or_default, store_json, CacheKey, CacheStore};
use crate::date_key::DayKey;
use crate::error::RemoteError;
use crate::model::{DayRecord, EntryIdentity, FoodEntry};

/// Owns the merge step for day records.
///
/// Operations on the same day key are serialized (read, merge, write);
/// different days proceed independently.
pub struct DayReconciler<C: CacheStore> {
    cache: Arc<C>,
    locks: Mutex<HashMap<DayKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl<C: CacheStore> DayReconciler<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn day_lock(&self, day: DayKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(day).or_default().clone()
    }

    /// Cached record for `day` with its cached food list attached.
    pub fn cached_record(&self, day: DayKey) -> DayRecord {
        let stored: Option<DayRecord> = load_json_or_default(&*self.cache, &CacheKey::Day(day));
        let foods: Vec<FoodEntry> = load_json_or_default(&*self.cache, &CacheKey::Food(day));
        let mut record = stored.unwrap_or_else(|| DayRecord::new(day));
        record.date = day;
        record.foods = foods;
        record
    }

    fn write_through(&self, record: &DayRecord) {
        let day = record.date;
        let result = store_json(&*self.cache, &CacheKey::Food(day), &record.foods)
            .and_then(|_| store_json(&*self.cache, &CacheKey::Day(day), record));
        if let Err(e) = result {
            tracing::warn!(day = %day, error = %e, "failed to write merged day to cache");
        }
    }

    /// Fetch remote entries for `day`, merge them with the cached entries and
    /// persist the result.
    ///
    /// Never fails: when the fetch errors the merge runs on the cached
    /// entries alone.
    pub async fn reconcile_day<F>(&self, day: DayKey, fetch: F) -> DayRecord
    where
        F: Future<Output = Result<Vec<FoodEntry>, RemoteError>>,
    {
        let lock = self.day_lock(day);
        let _guard = lock.lock().await;

        let remote = match fetch.await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(day = %day, error = %e, "food fetch failed, merging cached entries only");
                Vec::new()
            }
        };

        let base = self.cached_record(day);
        let merged = merge_day(&remote, &base.foods, &base);
        tracing::debug!(
            day = %day,
            remote = remote.len(),
            local = base.foods.len(),
            merged = merged.foods.len(),
            calories = merged.calories,
            "day reconciled"
        );
        self.write_through(&merged);
        merged
    }

    /// Log a food entry locally. Returns the updated record.
    pub async fn add_food(&self, day: DayKey, entry: FoodEntry) -> DayRecord {
        self.update(day, |record| {
            if !record.add_food(entry) {
                tracing::debug!(day = %day, "duplicate food entry ignored");
            }
        })
        .await
    }

    pub async fn remove_food(&self, day: DayKey, identity: &EntryIdentity) -> DayRecord {
        self.update(day, |record| {
            record.remove_food(identity);
        })
        .await
    }

    /// Apply a local mutation to the cached record under the day lock.
    pub async fn update<F>(&self, day: DayKey, mutate: F) -> DayRecord
    where
        F: FnOnce(&mut DayRecord),
    {
        let lock = self.day_lock(day);
        let _guard = lock.lock().await;

        let mut record = self.cached_record(day);
        mutate(&mut record);
        record.calories = record.food_total();
        self.write_through(&record);
        record
    }
}
