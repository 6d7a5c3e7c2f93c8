//! # Lifeloop Core Library
//!
//! This library provides the state engine behind the Lifeloop personal
//! productivity app: habits, tasks, routines, health logging and finances.
//! Screens are thin views over a remote backend; everything with rules lives
//! here and is also reachable from the standalone CLI binary.
//!
//! ## Architecture
//!
//! - **Day keys**: every day-scoped value is keyed by a canonical calendar
//!   day, independent of how the date was written
//! - **Reconciliation**: remote and locally cached food logs merge without
//!   losing or duplicating entries
//! - **Derived state**: habit streaks, nutrition totals and ledger summaries
//! - **Scheduling**: recurrence rules expand into notification triggers that
//!   are rebuilt from scratch on every change
//! - **Storage**: SQLite key/value cache and TOML configuration
//! - **Remote**: REST client for the managed backend, or offline mode
//!
//! ## Key Components
//!
//! - [`Session`]: Loads cached state, refreshes it and applies mutations
//! - [`DayReconciler`]: Per-day merge with cache write-through
//! - [`RecurrenceResolver`]: Recurrence rules to trigger specs
//! - [`NotificationScheduler`]: Cancel-all then re-register passes
//! - [`Config`]: Application configuration management

pub mod cache;
pub mod date_key;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod recurrence;
pub mod remote;
pub mod session;
pub mod storage;
pub mod streak;
pub mod summary;

pub use cache::{CacheKey, CacheStore, MemoryCache};
pub use date_key::{build_date_time, DayKey, TimeOfDay};
pub use error::{CacheError, ConfigError, CoreError, RemoteError, SchedulingError, ValidationError};
pub use model::{
    Cadence, DayRecord, EntryIdentity, EntryKind, EventKind, FoodEntry, LedgerEntry, Recurrence,
    RecurringItem, Routine, RoutineTask, ScheduledEvent,
};
pub use notify::{
    NotificationBackend, NotificationIntent, NotificationScheduler, Permission, RecordingBackend,
    ScheduleReport, ScheduleSnapshot, ScheduleState,
};
pub use reconcile::{merge_day, DayReconciler};
pub use recurrence::{RecurrenceResolver, TriggerSpec};
pub use remote::{ConfiguredRemote, HttpRemote, RemoteSource};
pub use session::{EngineState, RefreshReport, Session};
pub use storage::{CacheDb, Config, RemoteConfig, Theme};
pub use summary::{LedgerSummary, NutritionTotals};
