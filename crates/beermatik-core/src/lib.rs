//! # Beermatik Core Library
//!
//! Core business logic for Beermatik, a beer-session tracker with adaptive
//! reminder notifications. The library is CLI-first: every operation is
//! available through the standalone CLI binary, and any GUI shell is a thin
//! layer over the same crate.
//!
//! ## Architecture
//!
//! - **Session store**: durable single-writer state for the active session
//!   (entry log, counters, reminder schedule) over an opaque string
//!   key-value store
//! - **Reminder scheduler**: keeps exactly one platform alert armed, timed
//!   from the user's most recent inter-beer gap, with stale-schedule
//!   catch-up on startup
//! - **Storage**: SQLite key-value backend and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionStore`]: append/reset/query operations over the session
//! - [`ReminderScheduler`]: enable/disable/test/stats plus reconciliation
//! - [`KeyValueStore`] / [`AlertBackend`]: the two platform capability seams

pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{AlertError, ConfigError, CoreError, StorageError};
pub use notify::{
    AlertBackend, MockAlerts, ReminderScheduler, ReminderState, ReminderStats, ReminderText,
};
pub use session::{now_ms, BeerEntry, BeerSize, ReminderSchedule, Session, SessionSnapshot};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::SessionStore;
