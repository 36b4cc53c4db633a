//! In-memory observable state.
//!
//! [`TotalState`] holds the current total and the last-updated string as two
//! independent [`watch`] channels. Observers call `subscribe_*` and check
//! `has_changed` / `borrow_and_update` on the receiver; every mutation marks
//! all receivers changed synchronously.

use tokio::sync::watch;

use crate::record::NEVER;

/// Observable counter and last-updated timestamp.
#[derive(Debug)]
pub struct TotalState {
    total: watch::Sender<u32>,
    last_updated: watch::Sender<String>,
}

impl Default for TotalState {
    fn default() -> Self {
        Self::new()
    }
}

impl TotalState {
    /// Create a state holding `0` and `"Never"`.
    #[must_use]
    pub fn new() -> Self {
        let (total, _) = watch::channel(0);
        let (last_updated, _) = watch::channel(NEVER.to_string());
        Self {
            total,
            last_updated,
        }
    }

    /// The current total.
    #[must_use]
    pub fn total(&self) -> u32 {
        *self.total.borrow()
    }

    /// The current last-updated string.
    #[must_use]
    pub fn last_updated(&self) -> String {
        self.last_updated.borrow().clone()
    }

    /// Add one to the total, saturating at `u32::MAX`.
    pub fn increment(&self) {
        self.total.send_modify(|total| *total = total.saturating_add(1));
    }

    /// Replace the total.
    pub fn set_total(&self, total: u32) {
        self.total.send_replace(total);
    }

    /// Replace the last-updated string.
    pub fn set_last_updated(&self, last_updated: impl Into<String>) {
        self.last_updated.send_replace(last_updated.into());
    }

    /// Observe the total.
    #[must_use]
    pub fn subscribe_total(&self) -> watch::Receiver<u32> {
        self.total.subscribe()
    }

    /// Observe the last-updated string.
    #[must_use]
    pub fn subscribe_last_updated(&self) -> watch::Receiver<String> {
        self.last_updated.subscribe()
    }
}
