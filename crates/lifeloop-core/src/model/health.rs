//! Health day records and food log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require_text;
use crate::date_key::DayKey;
use crate::error::ValidationError;

/// One logged food item.
///
/// Entries created offline have no server `id` yet; see [`EntryIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date: Option<DayKey>,
}

/// Identity used to detect the same entry arriving from two sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryIdentity {
    Id(String),
    CreatedAt(DateTime<Utc>),
    Composite {
        name: String,
        calories: u32,
        date: Option<DayKey>,
    },
}

impl FoodEntry {
    /// A locally created entry: no server id, stamped with `created_at`.
    pub fn local(name: &str, calories: u32, day: DayKey, created_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            name: require_text("name", name)?,
            calories,
            created_at: Some(created_at),
            date: Some(day),
        })
    }

    /// Server id if present, else creation timestamp, else
    /// `(name, calories, date)`.
    pub fn identity(&self) -> EntryIdentity {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return EntryIdentity::Id(id.to_string());
        }
        if let Some(created_at) = self.created_at {
            return EntryIdentity::CreatedAt(created_at);
        }
        EntryIdentity::Composite {
            name: self.name.clone(),
            calories: self.calories,
            date: self.date,
        }
    }
}

/// Everything logged for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub date: DayKey,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub water_ml: u32,
    #[serde(default)]
    pub sleep_at: Option<String>,
    #[serde(default)]
    pub wake_at: Option<String>,
    #[serde(default)]
    pub sleep_quality: Option<u8>,
    #[serde(default)]
    pub foods: Vec<FoodEntry>,
    /// Always equal to the sum of `foods[].calories` once the record has
    /// passed through the reconciler or a mutation below.
    #[serde(default)]
    pub calories: u32,
}

impl DayRecord {
    pub fn new(date: DayKey) -> Self {
        Self {
            date,
            mood: None,
            water_ml: 0,
            sleep_at: None,
            wake_at: None,
            sleep_quality: None,
            foods: Vec::new(),
            calories: 0,
        }
    }

    pub fn food_total(&self) -> u32 {
        self.foods.iter().fold(0u32, |acc, f| acc.saturating_add(f.calories))
    }

    /// Append an entry unless one with the same identity is already logged.
    /// Returns whether the entry was added.
    pub fn add_food(&mut self, entry: FoodEntry) -> bool {
        let identity = entry.identity();
        if self.foods.iter().any(|f| f.identity() == identity) {
            return false;
        }
        self.foods.push(entry);
        self.calories = self.food_total();
        true
    }

    /// Remove the entry with `identity`. Returns whether anything was removed.
    pub fn remove_food(&mut self, identity: &EntryIdentity) -> bool {
        let before = self.foods.len();
        self.foods.retain(|f| &f.identity() != identity);
        self.calories = self.food_total();
        self.foods.len() != before
    }

    pub fn add_water(&mut self, ml: u32) {
        self.water_ml = self.water_ml.saturating_add(ml);
    }

    pub fn set_sleep_quality(&mut self, quality: u8) -> Result<(), ValidationError> {
        if !(1..=5).contains(&quality) {
            return Err(ValidationError::InvalidValue {
                field: "sleepQuality".into(),
                message: format!("expected 1-5, got {quality}"),
            });
        }
        self.sleep_quality = Some(quality);
        Ok(())
    }
}
