//! Remote data source.
//!
//! The managed backend is authoritative for every collection. Calls are
//! filtered by the signed-in user's id and may fail transiently; callers
//! degrade to cached data on error.

mod http;

pub use http::HttpRemote;

use std::future::Future;

use crate::date_key::DayKey;
use crate::error::{ConfigError, RemoteError};
use crate::model::{FoodEntry, LedgerEntry, RecurringItem, Routine, ScheduledEvent};
use crate::storage::Config;

pub trait RemoteSource: Send + Sync {
    fn fetch_habits(&self, user_id: &str) -> impl Future<Output = Result<Vec<RecurringItem>, RemoteError>> + Send;

    fn fetch_tasks(&self, user_id: &str) -> impl Future<Output = Result<Vec<ScheduledEvent>, RemoteError>> + Send;

    fn fetch_routines(&self, user_id: &str) -> impl Future<Output = Result<Vec<Routine>, RemoteError>> + Send;

    fn fetch_transactions(&self, user_id: &str) -> impl Future<Output = Result<Vec<LedgerEntry>, RemoteError>> + Send;

    fn fetch_food(&self, user_id: &str, day: DayKey) -> impl Future<Output = Result<Vec<FoodEntry>, RemoteError>> + Send;
}

/// Remote picked from configuration: HTTP when `remote.base_url` is set,
/// otherwise offline. Offline fetches report [`RemoteError::Unavailable`], so
/// sessions run from the cache alone.
pub enum ConfiguredRemote {
    Http(HttpRemote),
    Offline,
}

impl ConfiguredRemote {
    /// # Errors
    /// Returns an error when `remote.base_url` is set but is not a valid URL.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(match HttpRemote::from_config(&config.remote)? {
            Some(http) => ConfiguredRemote::Http(http),
            None => ConfiguredRemote::Offline,
        })
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ConfiguredRemote::Offline)
    }
}

impl RemoteSource for ConfiguredRemote {
    async fn fetch_habits(&self, user_id: &str) -> Result<Vec<RecurringItem>, RemoteError> {
        match self {
            ConfiguredRemote::Http(http) => http.fetch_habits(user_id).await,
            ConfiguredRemote::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn fetch_tasks(&self, user_id: &str) -> Result<Vec<ScheduledEvent>, RemoteError> {
        match self {
            ConfiguredRemote::Http(http) => http.fetch_tasks(user_id).await,
            ConfiguredRemote::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn fetch_routines(&self, user_id: &str) -> Result<Vec<Routine>, RemoteError> {
        match self {
            ConfiguredRemote::Http(http) => http.fetch_routines(user_id).await,
            ConfiguredRemote::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<LedgerEntry>, RemoteError> {
        match self {
            ConfiguredRemote::Http(http) => http.fetch_transactions(user_id).await,
            ConfiguredRemote::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn fetch_food(&self, user_id: &str, day: DayKey) -> Result<Vec<FoodEntry>, RemoteError> {
        match self {
            ConfiguredRemote::Http(http) => http.fetch_food(user_id, day).await,
            ConfiguredRemote::Offline => Err(RemoteError::Unavailable),
        }
    }
}
