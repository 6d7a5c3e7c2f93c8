//! Engine entities.
//!
//! Field names serialize in camelCase to match the rows returned by the
//! remote backend and the blobs written to the local cache.

pub mod event;
pub mod habit;
pub mod health;
pub mod ledger;
pub mod routine;

pub use event::{EventKind, ScheduledEvent};
pub use habit::{Cadence, Recurrence, RecurringItem};
pub use health::{DayRecord, EntryIdentity, FoodEntry};
pub use ledger::{EntryKind, LedgerEntry};
pub use routine::{Routine, RoutineTask};

/// Trim and require a non-empty value.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, crate::error::ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::ValidationError::MissingField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
