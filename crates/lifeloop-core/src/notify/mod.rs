//! Notification trigger scheduling.
//!
//! [`NotificationScheduler`] turns a [`ScheduleSnapshot`] into
//! [`NotificationIntent`]s and registers them with a [`NotificationBackend`].

mod backend;
mod intent;
mod scheduler;

pub use backend::{BackendCall, NotificationBackend, Permission, RecordingBackend, TriggerHandle};
pub use intent::{event_intents, habit_intents, plan, routine_intents, NotificationIntent, ScheduleSnapshot};
pub use scheduler::{InactiveReason, NotificationScheduler, ScheduleReport, ScheduleState};
