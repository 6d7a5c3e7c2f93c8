//! Finance ledger entries.

use serde::{Deserialize, Serialize};

use super::{new_id, require_text};
use crate::date_key::DayKey;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

/// A single transaction. `amount` is a non-negative magnitude; the sign is
/// implied by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub currency: String,
    /// As stored by the backend: a date or a date-time.
    pub date: String,
}

impl LedgerEntry {
    pub fn new(
        kind: EntryKind,
        amount: f64,
        category: &str,
        currency: &str,
        date: &str,
    ) -> Result<Self, ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "amount".into(),
                message: format!("expected a non-negative amount, got {amount}"),
            });
        }
        if DayKey::parse(date).is_none() {
            return Err(ValidationError::InvalidValue {
                field: "date".into(),
                message: format!("unrecognized date {date:?}"),
            });
        }
        Ok(Self {
            id: new_id(),
            kind,
            amount,
            category: require_text("category", category)?,
            currency: currency.trim().to_uppercase(),
            date: date.trim().to_string(),
        })
    }

    /// Calendar day of the entry; `None` when the stored date is unreadable.
    pub fn day(&self) -> Option<DayKey> {
        DayKey::parse(&self.date)
    }
}
