//! Session data model: beer sizes, logged entries, and the live session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Serving size of one logged beer. The volume is fixed by the size at
/// creation time; the serialized tags are the ones the historical mobile
/// releases persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeerSize {
    #[serde(rename = "20cl")]
    Cl20,
    #[serde(rename = "25cl")]
    Cl25,
    #[default]
    #[serde(rename = "33cl")]
    Cl33,
    #[serde(rename = "50cl")]
    Cl50,
    #[serde(rename = "75cl")]
    Cl75,
    #[serde(rename = "100cl")]
    Cl100,
}

#[derive(Error, Debug)]
#[error("unknown beer size '{0}' (expected one of 20cl, 25cl, 33cl, 50cl, 75cl, 100cl)")]
pub struct ParseSizeError(String);

impl BeerSize {
    pub const ALL: [BeerSize; 6] = [
        BeerSize::Cl20,
        BeerSize::Cl25,
        BeerSize::Cl33,
        BeerSize::Cl50,
        BeerSize::Cl75,
        BeerSize::Cl100,
    ];

    /// Volume in centiliters.
    pub fn volume_cl(self) -> u32 {
        match self {
            BeerSize::Cl20 => 20,
            BeerSize::Cl25 => 25,
            BeerSize::Cl33 => 33,
            BeerSize::Cl50 => 50,
            BeerSize::Cl75 => 75,
            BeerSize::Cl100 => 100,
        }
    }

    /// Stable persisted tag.
    pub fn as_str(self) -> &'static str {
        match self {
            BeerSize::Cl20 => "20cl",
            BeerSize::Cl25 => "25cl",
            BeerSize::Cl33 => "33cl",
            BeerSize::Cl50 => "50cl",
            BeerSize::Cl75 => "75cl",
            BeerSize::Cl100 => "100cl",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            BeerSize::Cl100 => "1L",
            other => other.as_str(),
        }
    }
}

impl FromStr for BeerSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BeerSize::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseSizeError(s.to_string()))
    }
}

impl fmt::Display for BeerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged beer event. Entries are append-only within a session and
/// their timestamps are non-decreasing in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerEntry {
    pub id: u64,
    pub size: BeerSize,
    /// Volume in centiliters, fixed by `size` at creation.
    #[serde(rename = "volume")]
    pub volume_cl: u32,
    /// Creation time, epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

/// The pending reminder: spacing and absolute fire time. The pair exists
/// as a unit -- a session either has both values or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    pub interval_ms: u64,
    pub next_at_ms: u64,
}

/// The single active tracking period, reset to reset.
///
/// `beer_count` and `total_volume_cl` are derived from `entries` and
/// recomputed on every append; they never drift independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub entries: Vec<BeerEntry>,
    pub beer_count: u32,
    pub total_volume_cl: u64,
    pub session_start_ms: u64,
    /// Timestamp of the most recent entry; `None` before the first beer.
    pub last_beer_ms: Option<u64>,
    /// Size the next logged entry will use.
    pub selected_size: BeerSize,
    /// User preference; survives a session reset.
    pub notifications_enabled: bool,
    pub schedule: Option<ReminderSchedule>,
}

impl Session {
    /// Default session starting at `now_ms`.
    pub fn default_at(now_ms: u64) -> Self {
        Self {
            entries: Vec::new(),
            beer_count: 0,
            total_volume_cl: 0,
            session_start_ms: now_ms,
            last_beer_ms: None,
            selected_size: BeerSize::default(),
            notifications_enabled: false,
            schedule: None,
        }
    }
}

/// Wire format for export/import, kept field-compatible with the snapshots
/// the historical releases produced (camelCase names, `0` as the "no beer
/// yet" sentinel, nullable schedule halves).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub beer_count: u32,
    pub total_volume: u64,
    pub session_start_time: u64,
    #[serde(default)]
    pub last_beer_time: u64,
    #[serde(default)]
    pub selected_size: BeerSize,
    #[serde(default)]
    pub notification_enabled: bool,
    #[serde(default)]
    pub beer_entries: Vec<BeerEntry>,
    #[serde(default)]
    pub notification_interval: Option<u64>,
    #[serde(default)]
    pub next_notification_time: Option<u64>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            beer_count: session.beer_count,
            total_volume: session.total_volume_cl,
            session_start_time: session.session_start_ms,
            last_beer_time: session.last_beer_ms.unwrap_or(0),
            selected_size: session.selected_size,
            notification_enabled: session.notifications_enabled,
            beer_entries: session.entries.clone(),
            notification_interval: session.schedule.map(|s| s.interval_ms),
            next_notification_time: session.schedule.map(|s| s.next_at_ms),
        }
    }
}

impl SessionSnapshot {
    /// Convert into a live session. A one-sided schedule (only interval or
    /// only fire time present) collapses to no schedule at all.
    pub fn into_session(self) -> Session {
        let schedule = match (self.notification_interval, self.next_notification_time) {
            (Some(interval_ms), Some(next_at_ms)) => Some(ReminderSchedule {
                interval_ms,
                next_at_ms,
            }),
            _ => None,
        };
        Session {
            entries: self.beer_entries,
            beer_count: self.beer_count,
            total_volume_cl: self.total_volume,
            session_start_ms: self.session_start_time,
            last_beer_ms: (self.last_beer_time > 0).then_some(self.last_beer_time),
            selected_size: self.selected_size,
            notifications_enabled: self.notification_enabled,
            schedule,
        }
    }
}

/// Current wall-clock time, epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
