//! Screen controller wiring the record store to the observable state.
//!
//! The controller follows the screen's lifecycle:
//!
//! - [`TotalController::launch`] loads the saved total (creating the record on
//!   first run) and shows when it was last updated;
//! - [`TotalController::increment`] handles the button;
//! - [`TotalController::persist`] writes the total back when the screen goes
//!   to the background or exits;
//! - [`TotalController::resume`] re-shows the last-updated notification.
//!
//! Store failures never reach the user. A failed read starts from zero, a
//! failed write is logged and dropped.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::record::{is_real_timestamp, timestamp_now, TotalRecord, NEVER, TOTAL_ID};
use crate::state::TotalState;
use crate::storage::RecordStore;

/// A transient message that disappears after its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    message: String,
    shown_at: Instant,
    lifetime: Duration,
}

impl Notification {
    /// Create a notification shown from now on.
    #[must_use]
    pub fn new(message: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            lifetime,
        }
    }

    /// The notification text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the notification should be gone at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.lifetime
    }
}

/// Everything the screen draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterView<'a> {
    /// `Total: {value}`.
    pub total_text: &'a str,
    /// The live notification, if any.
    pub notification: Option<&'a str>,
}

/// Format the displayed total.
#[must_use]
pub fn total_text(total: u32) -> String {
    format!("Total: {total}")
}

/// Store failures are expected (missing disk, locked file); anything else is a bug.
fn log_store_failure(what: &str, err: &Error) {
    if err.is_storage_error() {
        warn!("Could not {}: {}", what, err);
    } else {
        error!("Could not {}: {}", what, err);
    }
}

/// Lifecycle controller for the counter screen.
#[derive(Debug)]
pub struct TotalController<S> {
    store: S,
    state: TotalState,
    total_rx: watch::Receiver<u32>,
    total_text: String,
    notification: Option<Notification>,
    notification_lifetime: Duration,
}

impl<S: RecordStore> TotalController<S> {
    /// Create a controller over `store`. Nothing is read until [`Self::launch`].
    #[must_use]
    pub fn new(store: S, notification_lifetime: Duration) -> Self {
        let state = TotalState::new();
        let mut total_rx = state.subscribe_total();
        let total_text = total_text(*total_rx.borrow_and_update());
        Self {
            store,
            state,
            total_rx,
            total_text,
            notification: None,
            notification_lifetime,
        }
    }

    /// Load the saved total and show when it was last updated.
    pub fn launch(&mut self) {
        self.load();
        self.show_last_updated();
        info!(
            "Launched with total {} (last updated: {})",
            self.state.total(),
            self.state.last_updated()
        );
    }

    /// Push the saved record into the state, creating it if absent.
    ///
    /// A freshly created record leaves the state at `0` / `Never`. Any store
    /// error resets the state to `0` / `Never`.
    pub fn load(&mut self) {
        match self.read_or_create() {
            Ok(Some(record)) => {
                self.state.set_total(record.value);
                self.state.set_last_updated(record.last_updated);
            }
            Ok(None) => {}
            Err(e) => {
                log_store_failure("load saved total, starting from zero", &e);
                self.state.set_total(0);
                self.state.set_last_updated(NEVER);
            }
        }
        self.sync();
    }

    fn read_or_create(&self) -> Result<Option<TotalRecord>> {
        if let Some(record) = self.store.get(TOTAL_ID)? {
            debug!("Loaded total record: {:?}", record);
            return Ok(Some(record));
        }

        let record = TotalRecord::initial();
        self.store.insert(&record)?;
        info!("Created total record at {}", record.last_updated);
        Ok(None)
    }

    /// Show `Last updated: ...` unless nothing was ever saved.
    pub fn show_last_updated(&mut self) {
        let last_updated = self.state.last_updated();
        if is_real_timestamp(&last_updated) {
            self.notification = Some(Notification::new(
                format!("Last updated: {last_updated}"),
                self.notification_lifetime,
            ));
        }
    }

    /// Handle the increment button.
    pub fn increment(&mut self) {
        self.state.increment();
        self.sync();
    }

    /// Write the current total to the store, stamped with the current time.
    ///
    /// On success the state's last-updated follows. On failure nothing
    /// changes and nothing is reported beyond the log.
    pub fn persist(&mut self) {
        let now = timestamp_now();
        let record = TotalRecord::new(self.state.total(), now.clone());
        match self.write(&record) {
            Ok(()) => {
                debug!("Persisted total {}", record.value);
                self.state.set_last_updated(now);
            }
            Err(e) => log_store_failure(&format!("persist total {}", record.value), &e),
        }
    }

    fn write(&self, record: &TotalRecord) -> Result<()> {
        if !self.store.update(record)? {
            self.store.insert(record)?;
        }
        Ok(())
    }

    /// Back in the foreground: show the last-updated notification again.
    pub fn resume(&mut self) {
        self.show_last_updated();
    }

    /// Apply pending total changes to the displayed text.
    ///
    /// Returns `true` if the text changed.
    pub fn sync(&mut self) -> bool {
        if !self.total_rx.has_changed().unwrap_or(false) {
            return false;
        }
        let text = total_text(*self.total_rx.borrow_and_update());
        if text == self.total_text {
            return false;
        }
        self.total_text = text;
        true
    }

    /// Drop the notification once its lifetime has passed.
    pub fn expire_notification(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired_at(now))
        {
            self.notification = None;
        }
    }

    /// What the screen should show.
    #[must_use]
    pub fn view(&self) -> CounterView<'_> {
        CounterView {
            total_text: &self.total_text,
            notification: self.notification.as_ref().map(Notification::message),
        }
    }

    /// The live notification, if any.
    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// The observable state.
    #[must_use]
    pub fn state(&self) -> &TotalState {
        &self.state
    }

    /// The record store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::storage::{Storage, UnavailableStore};

    const LIFETIME: Duration = Duration::from_millis(3500);

    /// Wraps a real store and fails reads or writes on demand.
    #[derive(Debug)]
    struct FlakyStore {
        storage: Storage,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl FlakyStore {
        fn new(fail_reads: bool, fail_writes: bool) -> Self {
            Self {
                storage: Storage::open_in_memory().unwrap(),
                fail_reads,
                fail_writes,
            }
        }
    }

    impl RecordStore for FlakyStore {
        fn get(&self, id: i64) -> Result<Option<TotalRecord>> {
            if self.fail_reads {
                return Err(Error::store_unavailable("read failed"));
            }
            self.storage.get(id)
        }

        fn insert(&self, record: &TotalRecord) -> Result<()> {
            if self.fail_writes {
                return Err(Error::store_unavailable("write failed"));
            }
            self.storage.insert(record)
        }

        fn update(&self, record: &TotalRecord) -> Result<bool> {
            if self.fail_writes {
                return Err(Error::store_unavailable("write failed"));
            }
            self.storage.update(record)
        }
    }

    fn memory_storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    #[test]
    fn test_new_shows_zero_before_launch() {
        let controller = TotalController::new(memory_storage(), LIFETIME);
        assert_eq!(controller.view().total_text, "Total: 0");
        assert!(controller.view().notification.is_none());
    }

    #[test]
    fn test_fresh_launch_creates_record_without_notification() {
        let mut controller = TotalController::new(memory_storage(), LIFETIME);
        controller.launch();

        assert_eq!(controller.view().total_text, "Total: 0");
        assert!(controller.view().notification.is_none());
        assert_eq!(controller.state().last_updated(), NEVER);

        let record = controller.store().get(TOTAL_ID).unwrap().unwrap();
        assert_eq!(record.value, 0);
        assert!(record.has_been_updated());
        assert_eq!(controller.store().count().unwrap(), 1);
    }

    #[test]
    fn test_increments_update_display() {
        let mut controller = TotalController::new(memory_storage(), LIFETIME);
        controller.launch();

        for _ in 0..7 {
            controller.increment();
        }

        assert_eq!(controller.state().total(), 7);
        assert_eq!(controller.view().total_text, "Total: 7");
    }

    #[test]
    fn test_relaunch_restores_persisted_total() {
        let storage = memory_storage();

        let mut first = TotalController::new(&storage, LIFETIME);
        first.launch();
        for _ in 0..5 {
            first.increment();
        }
        first.persist();
        drop(first);

        let mut second = TotalController::new(&storage, LIFETIME);
        second.launch();

        assert_eq!(second.view().total_text, "Total: 5");
        let message = second.view().notification.unwrap();
        assert!(message.starts_with("Last updated: "));
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_read_failure_starts_from_zero() {
        init_test_logging();
        let mut controller = TotalController::new(FlakyStore::new(true, false), LIFETIME);
        controller.launch();

        assert_eq!(controller.state().total(), 0);
        assert_eq!(controller.state().last_updated(), NEVER);
        assert_eq!(controller.view().total_text, "Total: 0");
        assert!(controller.view().notification.is_none());
    }

    #[test]
    fn test_unavailable_store_starts_from_zero() {
        let mut controller =
            TotalController::new(UnavailableStore::new("could not open"), LIFETIME);
        controller.launch();
        controller.increment();
        controller.persist();

        assert_eq!(controller.view().total_text, "Total: 1");
        assert_eq!(controller.state().last_updated(), NEVER);
    }

    #[test]
    fn test_failed_reload_resets_state() {
        let mut controller = TotalController::new(FlakyStore::new(true, false), LIFETIME);
        controller.state().set_total(3);
        controller.state().set_last_updated("earlier");
        controller.sync();
        assert_eq!(controller.view().total_text, "Total: 3");

        controller.load();

        assert_eq!(controller.state().total(), 0);
        assert_eq!(controller.state().last_updated(), NEVER);
        assert_eq!(controller.view().total_text, "Total: 0");
    }

    #[test]
    fn test_existing_record_loads_value_and_timestamp() {
        let storage = memory_storage();
        storage.insert(&TotalRecord::new(9, "then")).unwrap();

        let mut controller = TotalController::new(&storage, LIFETIME);
        controller.launch();
        controller.increment();

        assert_eq!(controller.state().last_updated(), "then");
        assert_eq!(controller.view().total_text, "Total: 10");
        // Nothing is written until the screen is backgrounded
        assert_eq!(storage.get(TOTAL_ID).unwrap().unwrap().value, 9);
    }

    #[test]
    fn test_insert_failure_on_fresh_launch() {
        let mut controller = TotalController::new(FlakyStore::new(false, true), LIFETIME);
        controller.launch();

        assert_eq!(controller.state().total(), 0);
        assert_eq!(controller.state().last_updated(), NEVER);
        assert!(controller.store().storage.get(TOTAL_ID).unwrap().is_none());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        init_test_logging();
        let mut controller = TotalController::new(FlakyStore::new(false, true), LIFETIME);
        controller.launch();
        controller.increment();
        controller.increment();

        controller.persist();

        assert_eq!(controller.view().total_text, "Total: 2");
        assert_eq!(controller.state().last_updated(), NEVER);
        assert!(controller.view().notification.is_none());
    }

    #[test]
    fn test_poisoned_store_falls_back_and_swallows_writes() {
        init_test_logging();
        let store = std::sync::Arc::new(std::sync::Mutex::new(memory_storage()));
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the store");
        })
        .join();

        let mut controller = TotalController::new(&*store, LIFETIME);
        controller.launch();
        controller.increment();
        controller.persist();

        assert_eq!(controller.view().total_text, "Total: 1");
        assert_eq!(controller.state().last_updated(), NEVER);
    }

    #[test]
    fn test_persist_updates_last_updated() {
        let mut controller = TotalController::new(memory_storage(), LIFETIME);
        controller.launch();
        controller.increment();

        controller.persist();

        let last_updated = controller.state().last_updated();
        assert!(is_real_timestamp(&last_updated));
        let record = controller.store().get(TOTAL_ID).unwrap().unwrap();
        assert_eq!(record, TotalRecord::new(1, last_updated));
    }

    #[test]
    fn test_persist_without_record_inserts() {
        let storage = memory_storage();
        let mut controller = TotalController::new(&storage, LIFETIME);
        controller.increment();

        controller.persist();

        assert_eq!(storage.get(TOTAL_ID).unwrap().unwrap().value, 1);
    }

    #[test]
    fn test_resume_shows_notification_after_persist() {
        let mut controller = TotalController::new(memory_storage(), LIFETIME);
        controller.launch();
        assert!(controller.notification().is_none());

        controller.persist();
        controller.resume();

        let expected = format!("Last updated: {}", controller.state().last_updated());
        assert_eq!(controller.view().notification, Some(expected.as_str()));
    }

    #[test]
    fn test_notification_expires() {
        let storage = memory_storage();
        storage.insert(&TotalRecord::new(2, "then")).unwrap();
        let mut controller = TotalController::new(&storage, LIFETIME);
        controller.launch();

        let shown_at = Instant::now();
        controller.expire_notification(shown_at);
        assert_eq!(controller.view().notification, Some("Last updated: then"));

        controller.expire_notification(shown_at + LIFETIME + Duration::from_millis(1));
        assert!(controller.view().notification.is_none());
    }

    #[test]
    fn test_sync_reports_changes_once() {
        let mut controller = TotalController::new(memory_storage(), LIFETIME);
        assert!(!controller.sync());

        controller.state().set_total(4);
        assert!(controller.sync());
        assert_eq!(controller.view().total_text, "Total: 4");
        assert!(!controller.sync());
    }

    #[test]
    fn test_notification_expiry_boundary() {
        let notification = Notification::new("hi", Duration::from_secs(1));
        let start = Instant::now();
        assert_eq!(notification.message(), "hi");
        assert!(notification.is_expired_at(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_total_text() {
        assert_eq!(total_text(0), "Total: 0");
        assert_eq!(total_text(123), "Total: 123");
    }
}
