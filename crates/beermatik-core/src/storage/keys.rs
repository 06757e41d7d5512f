//! Persisted key namespace for the session store.
//!
//! The spellings match what the historical mobile releases wrote, so an
//! upgraded install keeps its data. Do not rename these.

pub const BEER_COUNT: &str = "beerCount";
pub const TOTAL_VOLUME: &str = "totalVolume";
pub const SESSION_START_TIME: &str = "sessionStartTime";
pub const LAST_BEER_TIME: &str = "lastBeerTime";
pub const SELECTED_SIZE: &str = "selectedSize";
pub const NOTIFICATION_ENABLED: &str = "notificationEnabled";
pub const BEER_ENTRIES: &str = "beerEntries";
pub const NOTIFICATION_INTERVAL: &str = "notificationInterval";
pub const NEXT_NOTIFICATION_TIME: &str = "nextNotificationTime";

/// Every key the session store owns, in one place for `clear_all_data`.
pub const ALL: &[&str] = &[
    BEER_COUNT,
    TOTAL_VOLUME,
    SESSION_START_TIME,
    LAST_BEER_TIME,
    SELECTED_SIZE,
    NOTIFICATION_ENABLED,
    BEER_ENTRIES,
    NOTIFICATION_INTERVAL,
    NEXT_NOTIFICATION_TIME,
];
