pub mod beer;
pub mod config;
pub mod notify;
pub mod session;

use std::sync::Arc;

use beermatik_core::storage::KeyValueStore;
use beermatik_core::{now_ms, Config, ReminderScheduler, SessionStore, SqliteStore};
use chrono::{Local, TimeZone};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Wiring shared by every invocation: database, session store, scheduler.
pub struct App {
    pub store: Arc<SessionStore>,
    pub scheduler: ReminderScheduler,
}

impl App {
    /// Open the store and run startup reconciliation: the session is loaded
    /// and a stale reminder schedule is advanced and re-armed.
    pub async fn init() -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(SqliteStore::open()?);
        let alerts = Arc::new(db.alerts());
        let store = Arc::new(SessionStore::new(db as Arc<dyn KeyValueStore>));
        let config = Config::load_or_default();
        let scheduler = ReminderScheduler::new(store.clone(), alerts, config.reminder.text());
        scheduler.start().await;
        Ok(Self { store, scheduler })
    }

    /// Current session as display JSON, with human-readable times.
    pub fn status_json(&self) -> serde_json::Value {
        match self.store.cached() {
            Some(session) => serde_json::json!({
                "beerCount": session.beer_count,
                "totalVolumeCl": session.total_volume_cl,
                "selectedSize": session.selected_size.as_str(),
                "sessionStart": format_ms(session.session_start_ms),
                "sessionElapsedMin": now_ms().saturating_sub(session.session_start_ms) / 60_000,
                "lastBeer": session.last_beer_ms.map(format_ms),
                "notificationsEnabled": session.notifications_enabled,
                "nextReminder": session.schedule.map(|s| format_ms(s.next_at_ms)),
                "reminderIntervalMin": session.schedule.map(|s| s.interval_ms / 60_000),
            }),
            None => serde_json::json!({ "beerCount": 0, "totalVolumeCl": 0 }),
        }
    }
}

/// Epoch milliseconds as local wall-clock time.
pub fn format_ms(ms: u64) -> String {
    Local
        .timestamp_millis_opt(ms as i64)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
