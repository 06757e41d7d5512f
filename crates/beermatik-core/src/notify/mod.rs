//! Reminder scheduling over the session store.
//!
//! Translates the session's computed schedule into exactly one armed
//! platform alert, reconciles stale schedules on startup, and exposes the
//! toggle/test/stats operations. Durable state lives in the session store;
//! the alert is always armed under the fixed [`REMINDER_ALERT_ID`] so a
//! fresh process replaces or cancels whatever an earlier one armed.
//!
//! ## State Transitions
//!
//! ```text
//! Disabled -> Armed      enable while permission is granted and a
//!                        computed schedule exists
//! Armed -> Armed         a new entry re-arms the single slot; a stale
//!                        fire time is first advanced by whole interval
//!                        multiples past now (no burst of missed alerts)
//! Armed -> Disabled      disable, session reset (call `stop` after
//!                        `start_new_session`), or permission revoked
//! ```

mod alerts;

pub use alerts::{AlertBackend, MockAlerts, ScheduledAlert};

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::session::{now_ms, ReminderSchedule};
use crate::store::SessionStore;

/// Delay for `send_test` alerts.
pub const TEST_ALERT_DELAY_MS: u64 = 2_000;

/// The one reminder slot. Arming under a fixed id makes replacement work
/// across process restarts, not just within one scheduler instance.
pub const REMINDER_ALERT_ID: &str = "beer-reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderState {
    Disabled,
    Armed,
    /// Transient, while a schedule recompute or catch-up is in flight.
    Reconciling,
}

/// Title and body for the reminder alert, from configuration.
#[derive(Debug, Clone)]
pub struct ReminderText {
    pub title: String,
    pub body: String,
}

impl Default for ReminderText {
    fn default() -> Self {
        Self {
            title: "Beermatik".to_string(),
            body: "Time for your next beer? Update your counter.".to_string(),
        }
    }
}

/// Instant snapshot of the reminder feature for UI display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderStats {
    pub has_scheduled: bool,
    pub next_at_ms: Option<u64>,
    pub interval_ms: Option<u64>,
}

/// Advance a stale fire time forward by whole interval multiples to the
/// first instant strictly after `now`. Missed slots never fire as a burst.
pub fn advance_past(next_at_ms: u64, interval_ms: u64, now: u64) -> u64 {
    if next_at_ms > now {
        return next_at_ms;
    }
    let interval = interval_ms.max(1);
    let missed = (now - next_at_ms) / interval + 1;
    next_at_ms + missed * interval
}

/// Arms and reconciles the single reminder slot.
///
/// Explicitly constructed and injected, one instance per app, like the
/// store it wraps.
pub struct ReminderScheduler {
    store: Arc<SessionStore>,
    alerts: Arc<dyn AlertBackend>,
    text: ReminderText,
    state: Mutex<ReminderState>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<SessionStore>, alerts: Arc<dyn AlertBackend>, text: ReminderText) -> Self {
        Self {
            store,
            alerts,
            text,
            state: Mutex::new(ReminderState::Disabled),
        }
    }

    pub fn state(&self) -> ReminderState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// App-start reconciliation. No-op while the preference is off;
    /// otherwise checks permission and re-arms, advancing a stale
    /// schedule first.
    pub async fn start(&self) {
        let session = self.store.load().await;
        if !session.notifications_enabled {
            return;
        }
        if !self.alerts.request_permission().await {
            self.auto_disable().await;
            return;
        }
        self.reconcile_and_arm(session.schedule).await;
    }

    /// Called after every appended entry: single-slot replacement of the
    /// armed alert with one for the fresh schedule.
    pub async fn on_entry_added(&self) {
        let session = self.store.load().await;
        if !session.notifications_enabled {
            return;
        }
        if session.schedule.is_none() {
            return;
        }
        if !self.alerts.request_permission().await {
            self.auto_disable().await;
            return;
        }
        self.reconcile_and_arm(session.schedule).await;
    }

    /// Persist the preference and apply it. Enabling requires permission:
    /// on denial the flag is reverted and the schedule cleared. Disabling
    /// cancels the armed alert and clears the schedule fields. Returns the
    /// effective preference.
    pub async fn set_enabled(&self, enabled: bool) -> bool {
        if enabled {
            if !self.alerts.request_permission().await {
                debug!("notification permission refused, reverting enable");
                self.store.update_notification_enabled(false).await;
                self.store.update_notification_schedule(None).await;
                self.disarm().await;
                return false;
            }
            self.store.update_notification_enabled(true).await;
            let session = self.store.load().await;
            self.reconcile_and_arm(session.schedule).await;
            true
        } else {
            self.store.update_notification_enabled(false).await;
            self.disarm().await;
            self.store.update_notification_schedule(None).await;
            false
        }
    }

    /// One-off delivery check a couple of seconds out, independent of the
    /// session schedule. Silently does nothing when permission is denied.
    pub async fn send_test(&self) {
        if !self.alerts.request_permission().await {
            return;
        }
        let id = format!("test-{}", Uuid::new_v4());
        let fire_at_ms = now_ms() + TEST_ALERT_DELAY_MS;
        if let Err(e) = self
            .alerts
            .schedule_one_shot(&id, &self.text.title, "Test notification.", fire_at_ms)
            .await
        {
            warn!("test alert failed: {e}");
        }
    }

    /// Cancel the armed alert and clear the schedule fields without
    /// touching the enabled preference. Call after `start_new_session`.
    pub async fn stop(&self) {
        self.disarm().await;
        self.store.update_notification_schedule(None).await;
    }

    /// Instant snapshot from the store cache; never touches durable
    /// storage or the alert backend.
    pub fn stats(&self) -> ReminderStats {
        let schedule = self.store.cached().and_then(|session| session.schedule);
        ReminderStats {
            has_scheduled: schedule.is_some(),
            next_at_ms: schedule.map(|s| s.next_at_ms),
            interval_ms: schedule.map(|s| s.interval_ms),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn reconcile_and_arm(&self, schedule: Option<ReminderSchedule>) {
        let Some(mut schedule) = schedule else {
            return;
        };
        self.set_state(ReminderState::Reconciling);
        let now = now_ms();
        if schedule.next_at_ms <= now {
            schedule.next_at_ms = advance_past(schedule.next_at_ms, schedule.interval_ms, now);
            self.store.update_notification_schedule(Some(schedule)).await;
        }
        self.arm(schedule).await;
    }

    async fn arm(&self, schedule: ReminderSchedule) {
        match self
            .alerts
            .schedule_one_shot(
                REMINDER_ALERT_ID,
                &self.text.title,
                &self.text.body,
                schedule.next_at_ms,
            )
            .await
        {
            Ok(()) => {
                debug!(next_at_ms = schedule.next_at_ms, "reminder armed");
                self.set_state(ReminderState::Armed);
            }
            Err(e) => {
                warn!("failed to arm reminder: {e}");
                self.set_state(ReminderState::Disabled);
            }
        }
    }

    /// Permission went away at a reconciliation point: turn the feature
    /// off instead of failing on every re-arm.
    async fn auto_disable(&self) {
        warn!("notification permission revoked, disabling reminders");
        self.store.update_notification_enabled(false).await;
        self.store.update_notification_schedule(None).await;
        self.disarm().await;
    }

    async fn disarm(&self) {
        if let Err(e) = self.alerts.cancel(REMINDER_ALERT_ID).await {
            debug!("alert cancel failed: {e}");
        }
        self.set_state(ReminderState::Disabled);
    }

    fn set_state(&self, state: ReminderState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::BeerSize;
    use crate::storage::{keys, KeyValueStore, MemoryStore};

    fn fixture(alerts: MockAlerts) -> (Arc<MemoryStore>, Arc<SessionStore>, Arc<MockAlerts>, ReminderScheduler) {
        let kv = Arc::new(MemoryStore::new());
        let store = Arc::new(SessionStore::new(kv.clone() as Arc<dyn KeyValueStore>));
        let alerts = Arc::new(alerts);
        let scheduler = ReminderScheduler::new(
            store.clone(),
            alerts.clone() as Arc<dyn AlertBackend>,
            ReminderText::default(),
        );
        (kv, store, alerts, scheduler)
    }

    #[test]
    fn advance_past_picks_first_future_slot() {
        // Three whole intervals behind: one step past the missed slots.
        assert_eq!(advance_past(100, 10, 130), 140);
        // Exactly on a slot boundary still moves strictly forward.
        assert_eq!(advance_past(100, 10, 100), 110);
        assert_eq!(advance_past(100, 10, 105), 110);
        // Already in the future: untouched.
        assert_eq!(advance_past(200, 10, 100), 200);
    }

    #[tokio::test]
    async fn cold_start_reconciles_stale_schedule() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        store.update_notification_enabled(true).await;
        let now = now_ms();
        let interval = 10 * 60_000;
        // Fire time three intervals in the past.
        store
            .update_notification_schedule(Some(ReminderSchedule {
                interval_ms: interval,
                next_at_ms: now - 3 * interval,
            }))
            .await;

        scheduler.start().await;

        assert_eq!(scheduler.state(), ReminderState::Armed);
        let live = alerts.live();
        assert_eq!(live.len(), 1);
        assert!(live[0].fire_at_ms > now);
        // Advanced by whole multiples from the original fire time.
        assert_eq!((live[0].fire_at_ms - (now - 3 * interval)) % interval, 0);
        // The advanced time was persisted.
        let session = store.load().await;
        assert_eq!(session.schedule.unwrap().next_at_ms, live[0].fire_at_ms);
    }

    #[tokio::test]
    async fn start_is_noop_while_disabled() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        scheduler.start().await;
        assert_eq!(scheduler.state(), ReminderState::Disabled);
        assert!(alerts.live().is_empty());
    }

    #[tokio::test]
    async fn entries_rearm_a_single_slot() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        store.update_notification_enabled(true).await;

        for _ in 0..4 {
            store.append_entry(BeerSize::Cl33).await;
            scheduler.on_entry_added().await;
        }

        // Four appends, schedules from the second onward, one live slot.
        assert!(alerts.schedule_calls() >= 2);
        assert_eq!(alerts.live().len(), 1);
        assert_eq!(scheduler.state(), ReminderState::Armed);
    }

    #[tokio::test]
    async fn first_entry_arms_nothing() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        store.update_notification_enabled(true).await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;
        assert!(alerts.live().is_empty());
        assert_eq!(scheduler.state(), ReminderState::Disabled);
    }

    #[tokio::test]
    async fn enable_with_denied_permission_reverts() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::denied());
        store.load().await;

        assert!(!scheduler.set_enabled(true).await);

        let session = store.load().await;
        assert!(!session.notifications_enabled);
        assert!(session.schedule.is_none());
        assert!(alerts.live().is_empty());
        assert_eq!(scheduler.state(), ReminderState::Disabled);
    }

    #[tokio::test]
    async fn disable_cancels_and_clears_schedule() {
        let (kv, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        scheduler.set_enabled(true).await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;
        assert_eq!(alerts.live().len(), 1);

        assert!(!scheduler.set_enabled(false).await);

        assert!(alerts.live().is_empty());
        let stats = scheduler.stats();
        assert!(!stats.has_scheduled);
        assert_eq!(stats.next_at_ms, None);
        assert!(kv.get(keys::NOTIFICATION_INTERVAL).await.unwrap().is_none());
        assert!(kv
            .get(keys::NEXT_NOTIFICATION_TIME)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn revoked_permission_auto_disables() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        scheduler.set_enabled(true).await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;
        assert_eq!(scheduler.state(), ReminderState::Armed);

        alerts.set_permission(false);
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;

        assert_eq!(scheduler.state(), ReminderState::Disabled);
        assert!(alerts.live().is_empty());
        let session = store.load().await;
        assert!(!session.notifications_enabled);
        assert!(session.schedule.is_none());
    }

    #[tokio::test]
    async fn stop_keeps_the_preference() {
        let (_, store, alerts, scheduler) = fixture(MockAlerts::granted());
        store.load().await;
        scheduler.set_enabled(true).await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;
        store.append_entry(BeerSize::Cl33).await;
        scheduler.on_entry_added().await;

        scheduler.stop().await;

        assert!(alerts.live().is_empty());
        assert!(!scheduler.stats().has_scheduled);
        let session = store.load().await;
        assert!(session.notifications_enabled);
        assert!(session.schedule.is_none());
    }

    #[tokio::test]
    async fn send_test_schedules_shortly_ahead() {
        let (_, _, alerts, scheduler) = fixture(MockAlerts::granted());
        let before = now_ms();
        scheduler.send_test().await;
        let live = alerts.live();
        assert_eq!(live.len(), 1);
        assert!(live[0].fire_at_ms >= before + TEST_ALERT_DELAY_MS);
        assert!(live[0].id.starts_with("test-"));
    }

    #[tokio::test]
    async fn send_test_is_silent_when_denied() {
        let (_, _, alerts, scheduler) = fixture(MockAlerts::denied());
        scheduler.send_test().await;
        assert_eq!(alerts.schedule_calls(), 0);
        assert!(alerts.live().is_empty());
    }

    #[tokio::test]
    async fn stats_come_from_cache_only() {
        let (_, store, _, scheduler) = fixture(MockAlerts::granted());
        assert_eq!(scheduler.stats(), ReminderStats::default());

        store.load().await;
        store.append_entry_at(BeerSize::Cl33, 1_000).await;
        store.append_entry_at(BeerSize::Cl33, 121_000).await;

        let stats = scheduler.stats();
        assert!(stats.has_scheduled);
        assert_eq!(stats.interval_ms, Some(120_000));
        assert_eq!(stats.next_at_ms, Some(241_000));
    }
}
