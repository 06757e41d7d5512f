//! Platform alert capability.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::AlertError;

/// One-shot alert primitive; one implementation per platform.
///
/// `schedule_one_shot` replaces any existing alert with the same id.
/// Permission denial is a normal boolean outcome, never an error.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    async fn request_permission(&self) -> bool;

    async fn schedule_one_shot(
        &self,
        id: &str,
        title: &str,
        body: &str,
        fire_at_ms: u64,
    ) -> Result<(), AlertError>;

    async fn cancel(&self, id: &str) -> Result<(), AlertError>;

    async fn cancel_all(&self) -> Result<(), AlertError>;
}

/// An alert as recorded by [`MockAlerts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAlert {
    pub id: String,
    pub title: String,
    pub body: String,
    pub fire_at_ms: u64,
}

/// Recording backend for tests: tracks live alerts and the grant state.
#[derive(Debug, Default)]
pub struct MockAlerts {
    permission: AtomicBool,
    schedule_calls: AtomicUsize,
    live: Mutex<HashMap<String, ScheduledAlert>>,
}

impl MockAlerts {
    /// Backend with permission granted.
    pub fn granted() -> Self {
        let alerts = Self::default();
        alerts.permission.store(true, Ordering::SeqCst);
        alerts
    }

    /// Backend with permission denied.
    pub fn denied() -> Self {
        Self::default()
    }

    /// Flip the grant state, simulating the user revoking or granting
    /// permission in system settings.
    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Alerts currently armed, unordered.
    pub fn live(&self) -> Vec<ScheduledAlert> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Total number of `schedule_one_shot` calls seen.
    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertBackend for MockAlerts {
    async fn request_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    async fn schedule_one_shot(
        &self,
        id: &str,
        title: &str,
        body: &str,
        fire_at_ms: u64,
    ) -> Result<(), AlertError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.to_string(),
                ScheduledAlert {
                    id: id.to_string(),
                    title: title.to_string(),
                    body: body.to_string(),
                    fire_at_ms,
                },
            );
        Ok(())
    }

    async fn cancel(&self, id: &str) -> Result<(), AlertError> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), AlertError> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
