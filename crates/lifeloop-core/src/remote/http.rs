//! REST client for the managed backend.
//!
//! Rows are read from `<base_url>/rest/v1/<table>` with PostgREST-style
//! filters (`user_id=eq.<id>`).

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::RemoteSource;
use crate::date_key::DayKey;
use crate::error::{ConfigError, RemoteError};
use crate::model::{FoodEntry, LedgerEntry, RecurringItem, Routine, ScheduledEvent};
use crate::storage::RemoteConfig;

const HABITS_TABLE: &str = "habits";
const TASKS_TABLE: &str = "tasks";
const ROUTINES_TABLE: &str = "routines";
const TRANSACTIONS_TABLE: &str = "transactions";
const FOOD_TABLE: &str = "food_entries";

pub struct HttpRemote {
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
    http_client: Client,
}

impl HttpRemote {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            key: "remote.base_url".into(),
            message: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            access_token: None,
            http_client: Client::new(),
        })
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        let token = token.trim();
        self.access_token = (!token.is_empty()).then(|| token.to_string());
        self
    }

    /// `None` when no base URL is configured.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, ConfigError> {
        if config.base_url.trim().is_empty() {
            return Ok(None);
        }
        let remote = Self::new(&config.base_url, &config.api_key)?.with_access_token(&config.access_token);
        Ok(Some(remote))
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> Result<Url, RemoteError> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, value) in filters {
                query.append_pair(column, value);
            }
        }
        Ok(url)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let url = self.table_url(table, filters)?;
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);

        let response = self
            .http_client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::AuthenticationRequired);
        }
        if !status.is_success() {
            return Err(RemoteError::Network(format!("{table}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let rows: Vec<T> = serde_json::from_str(&body).map_err(|e| RemoteError::Malformed {
            collection: table.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(table, rows = rows.len(), "fetched remote rows");
        Ok(rows)
    }

    fn by_user(user_id: &str) -> (&'static str, String) {
        ("user_id", format!("eq.{user_id}"))
    }
}

impl RemoteSource for HttpRemote {
    async fn fetch_habits(&self, user_id: &str) -> Result<Vec<RecurringItem>, RemoteError> {
        self.fetch_rows(HABITS_TABLE, &[Self::by_user(user_id)]).await
    }

    async fn fetch_tasks(&self, user_id: &str) -> Result<Vec<ScheduledEvent>, RemoteError> {
        self.fetch_rows(TASKS_TABLE, &[Self::by_user(user_id)]).await
    }

    async fn fetch_routines(&self, user_id: &str) -> Result<Vec<Routine>, RemoteError> {
        self.fetch_rows(ROUTINES_TABLE, &[Self::by_user(user_id)]).await
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<LedgerEntry>, RemoteError> {
        self.fetch_rows(TRANSACTIONS_TABLE, &[Self::by_user(user_id)]).await
    }

    async fn fetch_food(&self, user_id: &str, day: DayKey) -> Result<Vec<FoodEntry>, RemoteError> {
        let filters = [Self::by_user(user_id), ("date", format!("eq.{day}"))];
        self.fetch_rows(FOOD_TABLE, &filters).await
    }
}
