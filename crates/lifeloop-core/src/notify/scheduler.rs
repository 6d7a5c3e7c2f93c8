use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::intent::{plan, ScheduleSnapshot};
use super::{NotificationBackend, NotificationIntent, Permission};
use crate::error::SchedulingError;
use crate::recurrence::RecurrenceResolver;
use crate::storage::NotificationSettings;

/// Why a pass registered nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveReason {
    Disabled,
    NoSession,
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ScheduleState {
    Active,
    Inactive(InactiveReason),
}

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub state: ScheduleState,
    pub registered: usize,
    pub failed: usize,
    /// Tags that failed to register.
    pub failed_tags: Vec<String>,
}

impl ScheduleReport {
    fn inactive(reason: InactiveReason) -> Self {
        Self {
            state: ScheduleState::Inactive(reason),
            registered: 0,
            failed: 0,
            failed_tags: Vec::new(),
        }
    }
}

/// Keeps the backend's registered triggers in sync with engine state.
///
/// Every pass cancels everything and rebuilds from scratch; there is no
/// incremental patching. Passes are serialized, a second caller waits for the
/// running pass to finish.
pub struct NotificationScheduler<B: NotificationBackend> {
    backend: B,
    resolver: RecurrenceResolver,
    settings: NotificationSettings,
    in_flight: Mutex<()>,
}

impl<B: NotificationBackend> NotificationScheduler<B> {
    pub fn new(backend: B, resolver: RecurrenceResolver, settings: NotificationSettings) -> Self {
        Self {
            backend,
            resolver,
            settings,
            in_flight: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: NotificationSettings) {
        self.settings = settings;
    }

    /// Intents the current settings would register, without touching the
    /// backend.
    pub fn plan(&self, snapshot: &ScheduleSnapshot<'_>, now: DateTime<Utc>) -> Vec<NotificationIntent> {
        plan(&self.resolver, &self.settings, snapshot, now)
    }

    /// Cancel all registered triggers, then register the current plan.
    ///
    /// # Errors
    ///
    /// Only a failed `cancel_all` aborts the pass, since registering on top
    /// of stale triggers would duplicate them. Individual registration
    /// failures are logged and counted in the report.
    pub async fn reschedule_all(
        &self,
        snapshot: &ScheduleSnapshot<'_>,
        signed_in: bool,
        now: DateTime<Utc>,
    ) -> Result<ScheduleReport, SchedulingError> {
        let _guard = self.in_flight.lock().await;

        self.backend.cancel_all().await?;

        if !self.settings.enabled {
            tracing::debug!("notifications disabled, triggers cleared");
            return Ok(ScheduleReport::inactive(InactiveReason::Disabled));
        }
        if !signed_in {
            tracing::debug!("no session, triggers cleared");
            return Ok(ScheduleReport::inactive(InactiveReason::NoSession));
        }
        if self.backend.request_permission().await == Permission::Denied {
            tracing::info!("notification permission denied");
            return Ok(ScheduleReport::inactive(InactiveReason::PermissionDenied));
        }

        let intents = self.plan(snapshot, now);
        let mut report = ScheduleReport {
            state: ScheduleState::Active,
            registered: 0,
            failed: 0,
            failed_tags: Vec::new(),
        };
        for intent in &intents {
            match self.backend.register_trigger(intent).await {
                Ok(_) => report.registered += 1,
                Err(e) => {
                    tracing::warn!(tag = %intent.tag, error = %e, "failed to register trigger");
                    report.failed += 1;
                    report.failed_tags.push(intent.tag.clone());
                }
            }
        }

        tracing::info!(registered = report.registered, failed = report.failed, "notifications rescheduled");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventKind, Recurrence, RecurringItem, ScheduledEvent};
    use crate::notify::{BackendCall, RecordingBackend};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn fixtures() -> (Vec<RecurringItem>, Vec<ScheduledEvent>) {
        let habits = vec![
            RecurringItem::new("Read", "mind", Recurrence::daily(), None).unwrap(),
            RecurringItem::new("Gym", "body", Recurrence::weekly(["Mon", "Wed", "Fri"]), Some("18:00")).unwrap(),
        ];
        let events = vec![ScheduledEvent::new(EventKind::Task, "Ship", Some("2024-06-03"), Some("12:00")).unwrap()];
        (habits, events)
    }

    fn scheduler(backend: RecordingBackend) -> NotificationScheduler<RecordingBackend> {
        NotificationScheduler::new(backend, RecurrenceResolver::default(), NotificationSettings::default())
    }

    #[tokio::test]
    async fn registers_every_intent_after_cancel() {
        let (habits, events) = fixtures();
        let snapshot = ScheduleSnapshot {
            habits: &habits,
            events: &events,
            ..ScheduleSnapshot::default()
        };
        let scheduler = scheduler(RecordingBackend::granted());

        let report = scheduler.reschedule_all(&snapshot, true, now()).await.unwrap();
        assert_eq!(report.state, ScheduleState::Active);
        assert_eq!(report.registered, 1 + 3 + 2);
        assert_eq!(scheduler.backend().calls()[0], BackendCall::CancelAll);
        assert_eq!(scheduler.backend().registered().len(), 6);
    }

    #[tokio::test]
    async fn rescheduling_twice_does_not_duplicate() {
        let (habits, events) = fixtures();
        let snapshot = ScheduleSnapshot {
            habits: &habits,
            events: &events,
            ..ScheduleSnapshot::default()
        };
        let scheduler = scheduler(RecordingBackend::granted());
        scheduler.reschedule_all(&snapshot, true, now()).await.unwrap();
        scheduler.reschedule_all(&snapshot, true, now()).await.unwrap();
        assert_eq!(scheduler.backend().registered().len(), 6);
    }

    #[tokio::test]
    async fn gates_clear_triggers_and_stop() {
        let (habits, events) = fixtures();
        let snapshot = ScheduleSnapshot {
            habits: &habits,
            events: &events,
            ..ScheduleSnapshot::default()
        };

        let signed_out = scheduler(RecordingBackend::granted());
        let report = signed_out.reschedule_all(&snapshot, false, now()).await.unwrap();
        assert_eq!(report.state, ScheduleState::Inactive(InactiveReason::NoSession));
        assert_eq!(signed_out.backend().calls(), vec![BackendCall::CancelAll]);

        let denied = scheduler(RecordingBackend::new(Permission::Denied));
        let report = denied.reschedule_all(&snapshot, true, now()).await.unwrap();
        assert_eq!(report.state, ScheduleState::Inactive(InactiveReason::PermissionDenied));
        assert!(denied.backend().registered().is_empty());

        let mut disabled = scheduler(RecordingBackend::granted());
        disabled.set_settings(NotificationSettings {
            enabled: false,
            ..NotificationSettings::default()
        });
        let report = disabled.reschedule_all(&snapshot, true, now()).await.unwrap();
        assert_eq!(report.state, ScheduleState::Inactive(InactiveReason::Disabled));
        assert_eq!(disabled.backend().calls(), vec![BackendCall::CancelAll]);
    }

    #[tokio::test]
    async fn failed_registration_skips_and_continues() {
        let (habits, events) = fixtures();
        let snapshot = ScheduleSnapshot {
            habits: &habits,
            events: &events,
            ..ScheduleSnapshot::default()
        };
        let bad_tag = format!("habit:{}:daily", habits[0].id);
        let scheduler = scheduler(RecordingBackend::granted().fail_on(bad_tag.clone()));

        let report = scheduler.reschedule_all(&snapshot, true, now()).await.unwrap();
        assert_eq!(report.registered, 5);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_tags, vec![bad_tag]);
    }

    #[tokio::test]
    async fn concurrent_passes_do_not_interleave() {
        let (habits, events) = fixtures();
        let snapshot = ScheduleSnapshot {
            habits: &habits,
            events: &events,
            ..ScheduleSnapshot::default()
        };
        let scheduler = scheduler(RecordingBackend::granted());

        let (a, b) = tokio::join!(
            scheduler.reschedule_all(&snapshot, true, now()),
            scheduler.reschedule_all(&snapshot, true, now()),
        );
        a.unwrap();
        b.unwrap();

        // Each pass is cancel, permission, then six registrations.
        let calls = scheduler.backend().calls();
        assert_eq!(calls.len(), 16);
        for pass in calls.chunks(8) {
            assert_eq!(pass[0], BackendCall::CancelAll);
            assert_eq!(pass[1], BackendCall::RequestPermission);
            assert!(pass[2..].iter().all(|c| matches!(c, BackendCall::Register(_))));
        }
        assert_eq!(scheduler.backend().registered().len(), 6);
    }
}
