use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;

use serde::Serialize;

use super::NotificationIntent;
use crate::error::SchedulingError;

/// Outcome of asking the platform for notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
}

/// Opaque identifier the backend hands back for a registered trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TriggerHandle(pub String);

/// Platform notification facility.
///
/// The engine only computes triggers; delivery belongs to the backend.
pub trait NotificationBackend: Send + Sync {
    fn request_permission(&self) -> impl Future<Output = Permission> + Send;

    fn register_trigger(
        &self,
        intent: &NotificationIntent,
    ) -> impl Future<Output = Result<TriggerHandle, SchedulingError>> + Send;

    /// Remove every trigger previously registered by this application.
    fn cancel_all(&self) -> impl Future<Output = Result<(), SchedulingError>> + Send;
}

/// One call observed by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    RequestPermission,
    CancelAll,
    Register(String),
}

/// In-memory backend that records what would have been registered.
///
/// Used for dry runs and tests. Tags listed via [`RecordingBackend::fail_on`]
/// are rejected to simulate platform errors.
#[derive(Debug)]
pub struct RecordingBackend {
    permission: Permission,
    failing: HashSet<String>,
    registered: Mutex<Vec<NotificationIntent>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission,
            failing: HashSet::new(),
            registered: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        Self::new(Permission::Granted)
    }

    pub fn fail_on(mut self, tag: impl Into<String>) -> Self {
        self.failing.insert(tag.into());
        self
    }

    /// Intents currently registered (cleared by `cancel_all`).
    pub fn registered(&self) -> Vec<NotificationIntent> {
        lock(&self.registered).clone()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: BackendCall) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl NotificationBackend for RecordingBackend {
    async fn request_permission(&self) -> Permission {
        self.record(BackendCall::RequestPermission);
        self.permission
    }

    async fn register_trigger(&self, intent: &NotificationIntent) -> Result<TriggerHandle, SchedulingError> {
        self.record(BackendCall::Register(intent.tag.clone()));
        // Give concurrent callers a chance to run between registrations.
        tokio::task::yield_now().await;

        if self.failing.contains(&intent.tag) {
            return Err(SchedulingError::RegistrationFailed {
                tag: intent.tag.clone(),
                message: "rejected by backend".into(),
            });
        }
        lock(&self.registered).push(intent.clone());
        Ok(TriggerHandle(intent.tag.clone()))
    }

    async fn cancel_all(&self) -> Result<(), SchedulingError> {
        self.record(BackendCall::CancelAll);
        lock(&self.registered).clear();
        Ok(())
    }
}
