//! Durable, crash-consistent session store.
//!
//! All session reads and writes go through [`SessionStore`] so the
//! in-memory cache and the durable store never diverge for long. Mutating
//! operations are serialized through a single cooperative queue (one
//! `tokio::sync::Mutex` held for the whole operation), so two rapid
//! invocations can no longer interleave their field writes.
//!
//! Known gap, kept deliberately: the field writes of one operation are
//! independent and unordered. When one of them fails the others are not
//! rolled back, so the durable store can end up with, say, updated entries
//! but a stale schedule. The cache is only refreshed once the whole write
//! set succeeded, which means a failed write leaves cache and store
//! divergent until the next `load`.

use std::str::FromStr;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::StorageError;
use crate::session::{now_ms, BeerEntry, BeerSize, ReminderSchedule, Session, SessionSnapshot};
use crate::storage::{keys, KeyValueStore};

/// Floor substituted when the observed gap is zero or negative (clock skew
/// or corrupted data): 1 minute.
pub const MIN_FALLBACK_INTERVAL_MS: u64 = 60 * 1000;

/// Ceiling so one outlier gap never schedules an absurdly distant
/// reminder: 240 minutes.
pub const MAX_SAFETY_INTERVAL_MS: u64 = 240 * 60 * 1000;

/// Derive the reminder schedule from the entry log.
///
/// Last-gap predictor: the next beer is assumed to arrive after the same
/// gap as the most recent two entries -- deliberately not an average over
/// the session. With fewer than two entries there is no observed pacing
/// and no schedule.
pub fn compute_schedule(entries: &[BeerEntry]) -> Option<ReminderSchedule> {
    if entries.len() < 2 {
        return None;
    }
    let last = entries.last()?;
    let prev = &entries[entries.len() - 2];
    let interval_ms = match last.timestamp_ms.checked_sub(prev.timestamp_ms) {
        Some(gap) if gap > 0 => gap.min(MAX_SAFETY_INTERVAL_MS),
        _ => MIN_FALLBACK_INTERVAL_MS,
    };
    Some(ReminderSchedule {
        interval_ms,
        next_at_ms: last.timestamp_ms.saturating_add(interval_ms),
    })
}

/// Durable single-writer store for the one active [`Session`].
///
/// Explicitly constructed and injected -- one instance is wired at startup
/// and handed by `Arc` to whatever needs it.
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    /// Per-session mutation queue: every mutating operation runs while
    /// holding this lock.
    op_lock: Mutex<()>,
    /// Last-known snapshot; `None` until the first `load` and after
    /// `clear_all_data`.
    cache: StdMutex<Option<Session>>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            op_lock: Mutex::new(()),
            cache: StdMutex::new(None),
        }
    }

    /// Read every persisted field, falling back to per-field defaults for
    /// anything missing or unparseable, and refresh the cache. A total
    /// read failure yields the full default session -- the caller always
    /// has something to render.
    pub async fn load(&self) -> Session {
        let _op = self.op_lock.lock().await;
        let session = match self.read_all().await {
            Ok(session) => session,
            Err(e) => {
                warn!("session load failed, falling back to defaults: {e}");
                Session::default_at(now_ms())
            }
        };
        self.set_cache(Some(session.clone()));
        session
    }

    /// Log one beer of the given size at the current time, recompute the
    /// derived counters and the reminder schedule, and persist the lot.
    pub async fn append_entry(&self, size: BeerSize) {
        self.append_entry_at(size, now_ms()).await;
    }

    /// Append with an explicit timestamp. Entry point for deterministic
    /// tests; `append_entry` is the public face.
    pub(crate) async fn append_entry_at(&self, size: BeerSize, timestamp_ms: u64) {
        let _op = self.op_lock.lock().await;

        let current = self
            .cached()
            .unwrap_or_else(|| Session::default_at(timestamp_ms));
        let mut entries = current.entries;
        // Ids are creation timestamps, bumped past the previous id so
        // rapid appends stay unique.
        let id = entries
            .last()
            .map_or(timestamp_ms, |e| timestamp_ms.max(e.id + 1));
        entries.push(BeerEntry {
            id,
            size,
            volume_cl: size.volume_cl(),
            timestamp_ms,
        });

        let beer_count = entries.len() as u32;
        let total_volume_cl = entries.iter().map(|e| u64::from(e.volume_cl)).sum();
        let schedule = compute_schedule(&entries);

        if let Err(e) = self
            .persist_entries(&entries, beer_count, total_volume_cl, timestamp_ms, schedule)
            .await
        {
            warn!("append not persisted, cache left unchanged: {e}");
            return;
        }

        self.update_cache(|session| {
            session.entries = entries;
            session.beer_count = beer_count;
            session.total_volume_cl = total_volume_cl;
            session.last_beer_ms = Some(timestamp_ms);
            session.schedule = schedule;
        });
    }

    /// Persist the size the next logged beer will use.
    pub async fn update_selected_size(&self, size: BeerSize) {
        let _op = self.op_lock.lock().await;
        if let Err(e) = self.kv.set(keys::SELECTED_SIZE, size.as_str()).await {
            warn!("selected size not persisted: {e}");
            return;
        }
        self.update_cache(|session| session.selected_size = size);
    }

    /// Persist the notification preference flag.
    pub async fn update_notification_enabled(&self, enabled: bool) {
        let _op = self.op_lock.lock().await;
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.kv.set(keys::NOTIFICATION_ENABLED, value).await {
            warn!("notification flag not persisted: {e}");
            return;
        }
        self.update_cache(|session| session.notifications_enabled = enabled);
    }

    /// Persist both schedule fields together -- present as a pair or
    /// removed as a pair, never one-sided.
    pub async fn update_notification_schedule(&self, schedule: Option<ReminderSchedule>) {
        let _op = self.op_lock.lock().await;
        if let Err(e) = self.write_schedule(schedule).await {
            warn!("schedule not persisted: {e}");
            return;
        }
        self.update_cache(|session| session.schedule = schedule);
    }

    /// Zero the counters, drop entries and schedule, stamp a fresh start
    /// time. `selected_size` and the notification preference survive.
    pub async fn start_new_session(&self) {
        let _op = self.op_lock.lock().await;
        let now = now_ms();
        let now_str = now.to_string();
        let result = tokio::try_join!(
            self.kv.set(keys::BEER_COUNT, "0"),
            self.kv.set(keys::TOTAL_VOLUME, "0"),
            self.kv.set(keys::SESSION_START_TIME, &now_str),
            self.kv.set(keys::LAST_BEER_TIME, "0"),
            self.kv.set(keys::BEER_ENTRIES, "[]"),
            self.kv.remove(keys::NOTIFICATION_INTERVAL),
            self.kv.remove(keys::NEXT_NOTIFICATION_TIME),
        );
        if let Err(e) = result {
            warn!("session reset not persisted: {e}");
            return;
        }
        self.update_cache(|session| {
            session.entries.clear();
            session.beer_count = 0;
            session.total_volume_cl = 0;
            session.session_start_ms = now;
            session.last_beer_ms = None;
            session.schedule = None;
        });
    }

    /// Remove every persisted key. A subsequent `load` yields defaults.
    pub async fn clear_all_data(&self) {
        let _op = self.op_lock.lock().await;
        if let Err(e) = self.kv.remove_many(keys::ALL).await {
            warn!("clear incomplete: {e}");
            return;
        }
        self.set_cache(None);
    }

    /// Last-known in-memory snapshot; never touches durable storage.
    pub fn cached(&self) -> Option<Session> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Full session snapshot as pretty JSON, for backup.
    pub async fn export(&self) -> String {
        let session = self.load().await;
        serde_json::to_string_pretty(&SessionSnapshot::from(&session)).unwrap_or_default()
    }

    /// Restore a snapshot produced by `export`. Returns false on malformed
    /// input (nothing mutated) or when a field write failed (best-effort,
    /// already-written fields stay written).
    pub async fn import(&self, data: &str) -> bool {
        let snapshot: SessionSnapshot = match serde_json::from_str(data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("import rejected, malformed snapshot: {e}");
                return false;
            }
        };
        let session = snapshot.into_session();

        let _op = self.op_lock.lock().await;
        let encoded = match serde_json::to_string(&session.entries) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("import rejected, entries not encodable: {e}");
                return false;
            }
        };
        let beer_count_str = session.beer_count.to_string();
        let total_volume_str = session.total_volume_cl.to_string();
        let session_start_str = session.session_start_ms.to_string();
        let last_beer_str = session.last_beer_ms.unwrap_or(0).to_string();
        let result = tokio::try_join!(
            self.kv.set(keys::BEER_COUNT, &beer_count_str),
            self.kv.set(keys::TOTAL_VOLUME, &total_volume_str),
            self.kv.set(keys::SESSION_START_TIME, &session_start_str),
            self.kv.set(keys::LAST_BEER_TIME, &last_beer_str),
            self.kv
                .set(keys::SELECTED_SIZE, session.selected_size.as_str()),
            self.kv.set(
                keys::NOTIFICATION_ENABLED,
                if session.notifications_enabled {
                    "true"
                } else {
                    "false"
                }
            ),
            self.kv.set(keys::BEER_ENTRIES, &encoded),
            self.write_schedule(session.schedule),
        );
        match result {
            Ok(_) => {
                self.set_cache(Some(session));
                true
            }
            Err(e) => {
                warn!("import incomplete: {e}");
                false
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn read_all(&self) -> Result<Session, StorageError> {
        let (count, volume, start, last, size, enabled, entries, interval, next) = tokio::try_join!(
            self.kv.get(keys::BEER_COUNT),
            self.kv.get(keys::TOTAL_VOLUME),
            self.kv.get(keys::SESSION_START_TIME),
            self.kv.get(keys::LAST_BEER_TIME),
            self.kv.get(keys::SELECTED_SIZE),
            self.kv.get(keys::NOTIFICATION_ENABLED),
            self.kv.get(keys::BEER_ENTRIES),
            self.kv.get(keys::NOTIFICATION_INTERVAL),
            self.kv.get(keys::NEXT_NOTIFICATION_TIME),
        )?;

        let entries: Vec<BeerEntry> = entries
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        let schedule = match (parse_field::<u64>(interval), parse_field::<u64>(next)) {
            (Some(interval_ms), Some(next_at_ms)) => Some(ReminderSchedule {
                interval_ms,
                next_at_ms,
            }),
            _ => None,
        };

        Ok(Session {
            beer_count: parse_field(count).unwrap_or(0),
            total_volume_cl: parse_field(volume).unwrap_or(0),
            session_start_ms: parse_field(start).unwrap_or_else(now_ms),
            last_beer_ms: parse_field::<u64>(last).filter(|&t| t > 0),
            selected_size: parse_field(size).unwrap_or_default(),
            notifications_enabled: enabled.as_deref() == Some("true"),
            entries,
            schedule,
        })
    }

    async fn persist_entries(
        &self,
        entries: &[BeerEntry],
        beer_count: u32,
        total_volume_cl: u64,
        last_beer_ms: u64,
        schedule: Option<ReminderSchedule>,
    ) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(entries)?;
        let beer_count_str = beer_count.to_string();
        let total_volume_str = total_volume_cl.to_string();
        let last_beer_str = last_beer_ms.to_string();
        tokio::try_join!(
            self.kv.set(keys::BEER_COUNT, &beer_count_str),
            self.kv.set(keys::TOTAL_VOLUME, &total_volume_str),
            self.kv.set(keys::BEER_ENTRIES, &encoded),
            self.kv.set(keys::LAST_BEER_TIME, &last_beer_str),
            self.write_schedule(schedule),
        )?;
        Ok(())
    }

    async fn write_schedule(&self, schedule: Option<ReminderSchedule>) -> Result<(), StorageError> {
        match schedule {
            Some(s) => {
                let interval_str = s.interval_ms.to_string();
                let next_at_str = s.next_at_ms.to_string();
                tokio::try_join!(
                    self.kv.set(keys::NOTIFICATION_INTERVAL, &interval_str),
                    self.kv.set(keys::NEXT_NOTIFICATION_TIME, &next_at_str),
                )?;
            }
            None => {
                tokio::try_join!(
                    self.kv.remove(keys::NOTIFICATION_INTERVAL),
                    self.kv.remove(keys::NEXT_NOTIFICATION_TIME),
                )?;
            }
        }
        Ok(())
    }

    fn set_cache(&self, session: Option<Session>) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn update_cache(&self, mutate: impl FnOnce(&mut Session)) {
        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let session = guard.get_or_insert_with(|| Session::default_at(now_ms()));
        mutate(session);
    }
}

fn parse_field<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|raw| raw.parse().ok())
}
