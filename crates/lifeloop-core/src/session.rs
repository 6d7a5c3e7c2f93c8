//! Session orchestration.
//!
//! A [`Session`] owns the in-memory collections for one user. It loads them
//! from the cache at startup, refreshes them from the remote source, applies
//! mutations with write-through to the cache and runs a scheduling pass after
//! every mutation that can change the set of notifications.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{load_json_or_default, store_json, CacheKey, CacheStore};
use crate::date_key::DayKey;
use crate::error::{RemoteError, Result, SchedulingError, ValidationError};
use crate::model::{
    DayRecord, EntryIdentity, EventKind, FoodEntry, LedgerEntry, Recurrence, RecurringItem, Routine,
    ScheduledEvent,
};
use crate::notify::{NotificationBackend, NotificationScheduler, ScheduleReport, ScheduleSnapshot};
use crate::reconcile::DayReconciler;
use crate::recurrence::RecurrenceResolver;
use crate::remote::RemoteSource;
use crate::storage::Config;
use crate::streak::{self, StreakDrift};
use crate::summary::{self, LedgerSummary};

/// Collections held by a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub habits: Vec<RecurringItem>,
    pub routines: Vec<Routine>,
    pub tasks: Vec<ScheduledEvent>,
    pub transactions: Vec<LedgerEntry>,
}

/// Signed-in identity persisted under [`CacheKey::Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    #[serde(default)]
    user_id: Option<String>,
}

/// Per-collection outcome of [`Session::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<String>,
}

fn lookup_error(field: &str, id: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: format!("no item with id {id}"),
    }
}

pub struct Session<C: CacheStore, R: RemoteSource, B: NotificationBackend> {
    cache: Arc<C>,
    remote: R,
    reconciler: DayReconciler<C>,
    scheduler: NotificationScheduler<B>,
    resolver: RecurrenceResolver,
    offset: FixedOffset,
    user_id: Option<String>,
    state: EngineState,
    last_schedule: Option<ScheduleReport>,
}

impl<C: CacheStore, R: RemoteSource, B: NotificationBackend> Session<C, R, B> {
    /// Start a session from whatever the cache holds. Callers follow up with
    /// [`Session::resume`] to register the cached notifications.
    pub fn start(cache: Arc<C>, remote: R, backend: B, config: &Config) -> Self {
        let resolver = RecurrenceResolver::from_config(config);
        let stored: StoredSession = load_json_or_default(&*cache, &CacheKey::Settings);
        let mut session = Self {
            reconciler: DayReconciler::new(cache.clone()),
            scheduler: NotificationScheduler::new(backend, resolver, config.notifications),
            cache,
            remote,
            resolver,
            offset: config.offset(),
            user_id: stored.user_id,
            state: EngineState::default(),
            last_schedule: None,
        };
        session.load_cached();
        session
    }

    /// Replace in-memory state with the cached collections.
    pub fn load_cached(&mut self) {
        let cache = &*self.cache;
        self.state = EngineState {
            habits: load_json_or_default(cache, &CacheKey::Habits),
            routines: load_json_or_default(cache, &CacheKey::Routines),
            tasks: load_json_or_default(cache, &CacheKey::Tasks),
            transactions: load_json_or_default(cache, &CacheKey::Transactions),
        };
        for routine in &mut self.state.routines {
            routine.normalize_positions();
        }
        tracing::debug!(
            habits = self.state.habits.len(),
            routines = self.state.routines.len(),
            tasks = self.state.tasks.len(),
            transactions = self.state.transactions.len(),
            "loaded cached state"
        );
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn scheduler(&self) -> &NotificationScheduler<B> {
        &self.scheduler
    }

    pub fn last_schedule(&self) -> Option<&ScheduleReport> {
        self.last_schedule.as_ref()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day `now` falls on in the configured offset.
    pub fn today(&self, now: DateTime<Utc>) -> DayKey {
        DayKey::from_instant(now, self.offset)
    }

    /// Startup scheduling pass over the cached collections.
    pub async fn resume(&mut self, now: DateTime<Utc>) -> Option<&ScheduleReport> {
        tracing::debug!(signed_in = self.is_signed_in(), "resuming session");
        self.reschedule(now).await
    }

    pub async fn sign_in(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ValidationError::MissingField("userId".into()).into());
        }
        self.user_id = Some(user_id.to_string());
        self.persist_session()?;
        self.reschedule(now).await;
        Ok(())
    }

    /// Forget the user. Cached collections are kept.
    pub async fn sign_out(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.user_id = None;
        self.persist_session()?;
        self.reschedule(now).await;
        Ok(())
    }

    fn persist_session(&self) -> Result<()> {
        let stored = StoredSession {
            user_id: self.user_id.clone(),
        };
        store_json(&*self.cache, &CacheKey::Settings, &stored)?;
        Ok(())
    }

    fn require_user(&self) -> Result<&str, ValidationError> {
        self.user_id.as_deref().ok_or(ValidationError::NotAuthenticated)
    }

    /// Fetch every collection concurrently. A collection whose fetch fails
    /// keeps its cached contents; the others are still replaced.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> Result<RefreshReport> {
        let Some(user) = self.user_id.clone() else {
            tracing::debug!("no session, skipping remote refresh");
            return Ok(RefreshReport::default());
        };

        let (habits, tasks, routines, transactions) = tokio::join!(
            self.remote.fetch_habits(&user),
            self.remote.fetch_tasks(&user),
            self.remote.fetch_routines(&user),
            self.remote.fetch_transactions(&user),
        );

        let mut report = RefreshReport::default();
        let cache = &*self.cache;
        apply_fetch(cache, CacheKey::Habits, habits, &mut self.state.habits, &mut report);
        apply_fetch(cache, CacheKey::Tasks, tasks, &mut self.state.tasks, &mut report);
        apply_fetch(cache, CacheKey::Routines, routines, &mut self.state.routines, &mut report);
        apply_fetch(cache, CacheKey::Transactions, transactions, &mut self.state.transactions, &mut report);
        for routine in &mut self.state.routines {
            routine.normalize_positions();
        }

        tracing::info!(refreshed = ?report.refreshed, failed = ?report.failed, "remote refresh finished");
        self.reschedule(now).await;
        Ok(report)
    }

    /// Merge the remote food log for `day` into the cached one.
    pub async fn reconcile_day(&self, day: DayKey) -> DayRecord {
        let user = self.user_id.clone();
        let remote = &self.remote;
        self.reconciler
            .reconcile_day(day, async move {
                match user {
                    Some(user) => remote.fetch_food(&user, day).await,
                    None => Err(RemoteError::AuthenticationRequired),
                }
            })
            .await
    }

    pub fn day_record(&self, day: DayKey) -> DayRecord {
        self.reconciler.cached_record(day)
    }

    pub async fn log_food(&self, day: DayKey, name: &str, calories: u32, now: DateTime<Utc>) -> Result<DayRecord> {
        let entry = FoodEntry::local(name, calories, day, now)?;
        Ok(self.reconciler.add_food(day, entry).await)
    }

    pub async fn remove_food(&self, day: DayKey, identity: &EntryIdentity) -> DayRecord {
        self.reconciler.remove_food(day, identity).await
    }

    pub async fn log_water(&self, day: DayKey, ml: u32) -> DayRecord {
        self.reconciler.update(day, |record| record.add_water(ml)).await
    }

    pub async fn rate_sleep(&self, day: DayKey, quality: u8) -> Result<DayRecord> {
        let mut outcome = Ok(());
        let record = self
            .reconciler
            .update(day, |record| outcome = record.set_sleep_quality(quality))
            .await;
        outcome?;
        Ok(record)
    }

    /// Create a habit. Requires a signed-in user and a non-blank title.
    pub async fn add_habit(
        &mut self,
        title: &str,
        category: &str,
        recurrence: Recurrence,
        reminder_time: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RecurringItem> {
        self.require_user()?;
        let item = RecurringItem::new(title, category, recurrence, reminder_time)?;
        self.state.habits.push(item.clone());
        store_json(&*self.cache, &CacheKey::Habits, &self.state.habits)?;
        tracing::info!(habit = %item.id, title = %item.title, "habit added");
        self.reschedule(now).await;
        Ok(item)
    }

    pub async fn remove_habit(&mut self, habit_id: &str, now: DateTime<Utc>) -> Result<RecurringItem> {
        let index = self
            .state
            .habits
            .iter()
            .position(|h| h.id == habit_id)
            .ok_or_else(|| lookup_error("habitId", habit_id))?;
        let removed = self.state.habits.remove(index);
        store_json(&*self.cache, &CacheKey::Habits, &self.state.habits)?;
        self.reschedule(now).await;
        Ok(removed)
    }

    /// Toggle today's completion of a habit.
    pub async fn toggle_habit(&mut self, habit_id: &str, now: DateTime<Utc>) -> Result<RecurringItem> {
        let today = self.today(now);
        let slot = self
            .state
            .habits
            .iter_mut()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| lookup_error("habitId", habit_id))?;
        *slot = streak::toggle_completion(slot, today);
        let updated = slot.clone();
        store_json(&*self.cache, &CacheKey::Habits, &self.state.habits)?;
        self.reschedule(now).await;
        Ok(updated)
    }

    pub async fn add_task(
        &mut self,
        kind: EventKind,
        title: &str,
        date: Option<&str>,
        time: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ScheduledEvent> {
        self.require_user()?;
        let event = ScheduledEvent::new(kind, title, date, time)?;
        self.state.tasks.push(event.clone());
        store_json(&*self.cache, &CacheKey::Tasks, &self.state.tasks)?;
        self.reschedule(now).await;
        Ok(event)
    }

    pub async fn complete_task(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<ScheduledEvent> {
        let task = self
            .state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| lookup_error("taskId", task_id))?;
        task.completed = !task.completed;
        let updated = task.clone();
        store_json(&*self.cache, &CacheKey::Tasks, &self.state.tasks)?;
        self.reschedule(now).await;
        Ok(updated)
    }

    pub async fn add_routine(
        &mut self,
        title: &str,
        time: Option<&str>,
        days: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Routine> {
        self.require_user()?;
        let routine = Routine::new(title, time, days)?;
        self.state.routines.push(routine.clone());
        store_json(&*self.cache, &CacheKey::Routines, &self.state.routines)?;
        self.reschedule(now).await;
        Ok(routine)
    }

    fn routine_mut(&mut self, routine_id: &str) -> Result<&mut Routine, ValidationError> {
        self.state
            .routines
            .iter_mut()
            .find(|r| r.id == routine_id)
            .ok_or_else(|| lookup_error("routineId", routine_id))
    }

    /// Persist routines after a change to one of them, then reschedule.
    async fn commit_routine(&mut self, updated: Routine, now: DateTime<Utc>) -> Result<Routine> {
        store_json(&*self.cache, &CacheKey::Routines, &self.state.routines)?;
        self.reschedule(now).await;
        Ok(updated)
    }

    pub async fn add_routine_task(&mut self, routine_id: &str, title: &str, now: DateTime<Utc>) -> Result<Routine> {
        let routine = self.routine_mut(routine_id)?;
        routine.add_task(title)?;
        let updated = routine.clone();
        self.commit_routine(updated, now).await
    }

    pub async fn remove_routine_task(&mut self, routine_id: &str, task_id: &str, now: DateTime<Utc>) -> Result<Routine> {
        let routine = self.routine_mut(routine_id)?;
        routine.remove_task(task_id)?;
        let updated = routine.clone();
        self.commit_routine(updated, now).await
    }

    /// Reorder a routine's sub-tasks. `ordered_ids` must be a permutation of
    /// the current sub-task ids.
    pub async fn reorder_routine(
        &mut self,
        routine_id: &str,
        ordered_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Routine> {
        let routine = self.routine_mut(routine_id)?;
        routine.reorder(ordered_ids)?;
        let updated = routine.clone();
        self.commit_routine(updated, now).await
    }

    pub fn add_transaction(&mut self, entry: LedgerEntry) -> Result<LedgerEntry> {
        self.require_user()?;
        self.state.transactions.push(entry.clone());
        store_json(&*self.cache, &CacheKey::Transactions, &self.state.transactions)?;
        Ok(entry)
    }

    pub fn is_completed_today(&self, habit_id: &str, now: DateTime<Utc>) -> bool {
        let today = self.today(now);
        self.state
            .habits
            .iter()
            .find(|h| h.id == habit_id)
            .is_some_and(|h| streak::is_completed_today(h, today))
    }

    pub fn best_streak(&self) -> u32 {
        streak::best_streak(&self.state.habits)
    }

    pub fn streak_drift(&self, now: DateTime<Utc>) -> Vec<StreakDrift> {
        streak::streak_drift(&self.state.habits, self.today(now))
    }

    pub fn summary_for_day(&self, day: DayKey) -> LedgerSummary {
        summary::summary_for_day(&self.state.transactions, day)
    }

    /// Incomplete tasks and reminders due after `now`, soonest first.
    pub fn upcoming_tasks(&self, now: DateTime<Utc>, limit: usize) -> Vec<(DateTime<Utc>, &ScheduledEvent)> {
        let mut upcoming: Vec<_> = self
            .state
            .tasks
            .iter()
            .filter(|t| !t.completed)
            .filter_map(|t| self.resolver.due_instant(t).map(|due| (due, t)))
            .filter(|(due, _)| *due > now)
            .collect();
        upcoming.sort_by_key(|(due, _)| *due);
        upcoming.truncate(limit);
        upcoming
    }

    fn snapshot(&self) -> ScheduleSnapshot<'_> {
        ScheduleSnapshot {
            habits: &self.state.habits,
            routines: &self.state.routines,
            events: &self.state.tasks,
        }
    }

    /// Run a full scheduling pass and remember its report.
    ///
    /// Failures are logged; the previous report is kept.
    pub async fn reschedule(&mut self, now: DateTime<Utc>) -> Option<&ScheduleReport> {
        match self.try_reschedule(now).await {
            Ok(report) => self.last_schedule = Some(report),
            Err(e) => tracing::warn!(error = %e, "scheduling pass aborted"),
        }
        self.last_schedule.as_ref()
    }

    pub async fn try_reschedule(&self, now: DateTime<Utc>) -> Result<ScheduleReport, SchedulingError> {
        let snapshot = self.snapshot();
        self.scheduler
            .reschedule_all(&snapshot, self.is_signed_in(), now)
            .await
    }
}

fn apply_fetch<T: Serialize, C: CacheStore + ?Sized>(
    cache: &C,
    key: CacheKey,
    result: Result<Vec<T>, RemoteError>,
    slot: &mut Vec<T>,
    report: &mut RefreshReport,
) {
    match result {
        Ok(items) => {
            if let Err(e) = store_json(cache, &key, &items) {
                tracing::warn!(collection = %key, error = %e, "failed to write fetched rows to cache");
            }
            *slot = items;
            report.refreshed.push(key.as_key());
        }
        Err(e) => {
            tracing::warn!(collection = %key, error = %e, "fetch failed, keeping cached data");
            report.failed.push(key.as_key());
        }
    }
}
