//! Shared unread store.
//!
//! Wraps the [`UnreadLedger`] with the parts that touch the outside world:
//! debounced snapshot persistence, best-effort server read markers and a live
//! total for badges. All ledger access happens under a short synchronous lock
//! that is never held across an `.await`, so a poll result is applied
//! atomically with respect to every other caller.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::entities::{ChatSummary, ResourceKey, SectionItem, UnreadSnapshot, iso_now};
use crate::domain::ports::{ChatDataPort, SnapshotStoragePort};
use crate::domain::services::UnreadLedger;

/// Storage namespace of the unread snapshot.
pub const READ_STATE_NAMESPACE: &str = "readState";

/// Quiet period before a scheduled write reaches storage.
pub const DEFAULT_PERSIST_DELAY: Duration = Duration::from_secs(2);

/// Process-wide unread state, cheap to clone and share.
#[derive(Clone)]
pub struct UnreadStore {
    inner: Arc<UnreadStoreInner>,
}

struct UnreadStoreInner {
    ledger: Mutex<UnreadLedger>,
    loaded: AtomicBool,
    storage: Arc<dyn SnapshotStoragePort>,
    data_port: Arc<dyn ChatDataPort>,
    current_user_id: String,
    persist_delay: Duration,
    persist_timer: Mutex<Option<JoinHandle<()>>>,
    persist_lock: tokio::sync::Mutex<()>,
    total_tx: watch::Sender<usize>,
}

impl UnreadStore {
    /// Creates an empty store with the default persistence delay.
    #[must_use]
    pub fn new(
        storage: Arc<dyn SnapshotStoragePort>,
        data_port: Arc<dyn ChatDataPort>,
        current_user_id: impl Into<String>,
    ) -> Self {
        Self::with_persist_delay(storage, data_port, current_user_id, DEFAULT_PERSIST_DELAY)
    }

    /// Creates an empty store with a custom persistence delay.
    #[must_use]
    pub fn with_persist_delay(
        storage: Arc<dyn SnapshotStoragePort>,
        data_port: Arc<dyn ChatDataPort>,
        current_user_id: impl Into<String>,
        persist_delay: Duration,
    ) -> Self {
        let (total_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(UnreadStoreInner {
                ledger: Mutex::new(UnreadLedger::new()),
                loaded: AtomicBool::new(false),
                storage,
                data_port,
                current_user_id: current_user_id.into(),
                persist_delay,
                persist_timer: Mutex::new(None),
                persist_lock: tokio::sync::Mutex::new(()),
                total_tx,
            }),
        }
    }

    /// Id of the signed-in user.
    #[must_use]
    pub fn current_user_id(&self) -> &str {
        &self.inner.current_user_id
    }

    /// Whether [`load`](Self::load) has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::SeqCst)
    }

    /// Returns whether a resource has unread activity.
    #[must_use]
    pub fn is_unread(&self, key: &ResourceKey) -> bool {
        self.inner.ledger.lock().is_unread(key)
    }

    /// Returns the heuristic unread count of a resource.
    #[must_use]
    pub fn unread_count(&self, key: &ResourceKey) -> u32 {
        self.inner.ledger.lock().unread_count(key)
    }

    /// Returns the locally stored read timestamp of a resource.
    #[must_use]
    pub fn last_read(&self, key: &ResourceKey) -> Option<String> {
        self.inner.ledger.lock().last_read(key).map(str::to_string)
    }

    /// Best-known read point for `key`: the later of the local timestamp and
    /// `server_timestamp`.
    #[must_use]
    pub fn snapshot_last_read(&self, key: &str, server_timestamp: Option<&str>) -> Option<String> {
        self.inner
            .ledger
            .lock()
            .effective_last_read(key, server_timestamp)
            .map(str::to_string)
    }

    /// Number of resources with unread activity.
    #[must_use]
    pub fn total_unread(&self) -> usize {
        self.inner.ledger.lock().total_unread()
    }

    /// Subscribes to changes of [`total_unread`](Self::total_unread).
    #[must_use]
    pub fn subscribe_total(&self) -> watch::Receiver<usize> {
        self.inner.total_tx.subscribe()
    }

    /// Number of `items` with unread activity, for section header badges.
    #[must_use]
    pub fn section_unread_item_count(&self, items: &[SectionItem]) -> usize {
        self.inner.ledger.lock().section_unread_item_count(items)
    }

    /// Every unread resource key with its count, sorted by key.
    #[must_use]
    pub fn unread_entries(&self) -> Vec<(String, u32)> {
        self.inner.ledger.lock().unread_entries()
    }

    /// Applies a freshly fetched conversation list.
    pub fn update_from_chats(&self, chats: &[ChatSummary], current_user_id: &str) {
        let durable_changed = self.mutate(|ledger| ledger.apply_chats(chats, current_user_id));
        debug!(chats = chats.len(), "Applied conversation poll");
        if durable_changed {
            self.schedule_persist();
        }
    }

    /// Applies the result of a channel peek.
    pub fn update_channel_unread(
        &self,
        team_id: &str,
        channel_id: &str,
        latest_message_time: &str,
        from_user_id: Option<&str>,
        current_user_id: &str,
    ) {
        let durable_changed = self.mutate(|ledger| {
            ledger.apply_channel_peek(
                team_id,
                channel_id,
                latest_message_time,
                from_user_id,
                current_user_id,
            )
        });
        if durable_changed {
            self.schedule_persist();
        }
    }

    /// Marks a resource read locally without contacting the server.
    ///
    /// Meant for repeated calls while a conversation stays open.
    pub fn touch_read_timestamp(&self, key: &ResourceKey, message_timestamp: Option<&str>) {
        let now = iso_now();
        self.mutate(|ledger| ledger.touch(key, &now, message_timestamp));
        self.schedule_persist();
    }

    /// Marks a chat read locally, then tells the server in the background.
    ///
    /// Local state is updated before this returns and is never rolled back;
    /// a failing server call is only logged. Returns the background task
    /// handle when a runtime is available.
    pub fn mark_chat_read(&self, chat_id: &str) -> Option<JoinHandle<()>> {
        self.touch_read_timestamp(&ResourceKey::chat(chat_id), None);

        let data_port = Arc::clone(&self.inner.data_port);
        let chat_id = chat_id.to_string();
        let user_id = self.inner.current_user_id.clone();
        spawn_detached(async move {
            match data_port.mark_chat_read(&chat_id, &user_id).await {
                Ok(()) => debug!(chat_id = %chat_id, "Chat marked read on server"),
                Err(e) => warn!(chat_id = %chat_id, error = %e, "Failed to mark chat read on server"),
            }
        })
    }

    /// Marks a channel read locally, then tells the server in the background.
    pub fn mark_channel_read(&self, team_id: &str, channel_id: &str) -> Option<JoinHandle<()>> {
        self.touch_read_timestamp(&ResourceKey::channel(team_id, channel_id), None);

        let data_port = Arc::clone(&self.inner.data_port);
        let team_id = team_id.to_string();
        let channel_id = channel_id.to_string();
        spawn_detached(async move {
            if let Err(e) = data_port.mark_channel_read(&team_id, &channel_id).await {
                warn!(
                    team_id = %team_id,
                    channel_id = %channel_id,
                    error = %e,
                    "Failed to mark channel read on server"
                );
            }
        })
    }

    /// Overrides the heuristic count with an externally known exact value.
    pub fn set_exact_count(&self, key: &ResourceKey, count: u32) {
        self.mutate(|ledger| ledger.set_exact_count(key, count));
    }

    /// Loads the persisted snapshot once and merges it into memory.
    ///
    /// Read failures and unrecognised data leave the in-memory state as is.
    pub async fn load(&self) {
        if self.is_loaded() {
            return;
        }

        let blob = match self.inner.storage.get(READ_STATE_NAMESPACE).await {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to load read state, starting empty");
                None
            }
        };

        if let Some(snapshot) = blob.and_then(UnreadSnapshot::from_blob) {
            let keys = snapshot.read_timestamps.len();
            self.mutate(|ledger| ledger.merge_snapshot(snapshot));
            info!(read_timestamps = keys, "Restored read state");
        }

        self.inner.loaded.store(true, Ordering::SeqCst);
    }

    /// Writes the current snapshot now. Failures are logged.
    ///
    /// Writes are serialized, so the last one to finish carries the newest
    /// snapshot.
    pub async fn persist(&self) {
        let _write = self.inner.persist_lock.lock().await;
        let snapshot = self.inner.ledger.lock().snapshot();
        let blob = match serde_json::to_value(&snapshot) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to encode read state");
                return;
            }
        };

        match self.inner.storage.set(READ_STATE_NAMESPACE, blob).await {
            Ok(()) => debug!("Read state persisted"),
            Err(e) => warn!(error = %e, "Failed to persist read state"),
        }
    }

    /// Arms the persistence timer unless it is already armed.
    ///
    /// Calls made while the timer is pending collapse into its single write.
    pub fn schedule_persist(&self) {
        let mut timer = self.inner.persist_timer.lock();
        if timer.as_ref().is_some_and(|pending| !pending.is_finished()) {
            return;
        }

        let store = self.clone();
        let delay = self.inner.persist_delay;
        *timer = spawn_detached(async move {
            tokio::time::sleep(delay).await;
            store.inner.persist_timer.lock().take();
            store.persist().await;
        });
    }

    /// Cancels any pending timer and persists immediately.
    pub async fn flush(&self) {
        self.cancel_persist_timer();
        self.persist().await;
    }

    /// Drops all state and forgets that a snapshot was loaded.
    pub fn reset(&self) {
        self.cancel_persist_timer();
        self.mutate(UnreadLedger::clear);
        self.inner.loaded.store(false, Ordering::SeqCst);
    }

    fn cancel_persist_timer(&self) {
        let pending = self.inner.persist_timer.lock().take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut UnreadLedger) -> R) -> R {
        let (result, total) = {
            let mut ledger = self.inner.ledger.lock();
            let result = apply(&mut ledger);
            (result, ledger.total_unread())
        };

        self.inner.total_tx.send_if_modified(|current| {
            if *current == total {
                false
            } else {
                *current = total;
                true
            }
        });
        result
    }
}

fn spawn_detached<F>(future: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(future)),
        Err(_) => {
            warn!("No async runtime available, background task skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessagePreview;
    use crate::domain::errors::DataSourceError;
    use crate::domain::ports::mocks::{MockChatDataPort, MockSnapshotStorage};
    use serde_json::json;

    const ME: &str = "me-123";

    fn chat(id: &str, preview_id: &str, time: &str, from: &str) -> ChatSummary {
        ChatSummary::new(id).with_preview(MessagePreview::new(
            preview_id,
            time,
            Some(from.to_string()),
        ))
    }

    fn make_store(storage: Arc<MockSnapshotStorage>, data_port: MockChatDataPort) -> UnreadStore {
        UnreadStore::new(storage, Arc::new(data_port), ME)
    }

    #[tokio::test]
    async fn test_new_chat_message_is_counted_once() {
        let store = make_store(Arc::new(MockSnapshotStorage::new()), MockChatDataPort::new());
        let key = ResourceKey::chat("chat-1");
        let chats = [chat("chat-1", "msg-1", "2026-02-28T12:00:00Z", "other-user")];

        store.update_from_chats(&chats, ME);
        assert!(store.is_unread(&key));
        assert_eq!(store.unread_count(&key), 1);

        store.update_from_chats(&chats, ME);
        assert_eq!(store.unread_count(&key), 1);
    }

    #[tokio::test]
    async fn test_mark_chat_read_is_local_first() {
        let mut data_port = MockChatDataPort::new();
        data_port
            .expect_mark_chat_read()
            .withf(|chat_id, user_id| chat_id == "chat-mark" && user_id == ME)
            .times(1)
            .returning(|_, _| Ok(()));
        let store = make_store(Arc::new(MockSnapshotStorage::new()), data_port);
        let key = ResourceKey::chat("chat-mark");

        store.update_from_chats(&[chat("chat-mark", "m", "2026-02-28T12:00:00Z", "other")], ME);
        assert!(store.is_unread(&key));

        let remote = store.mark_chat_read("chat-mark");

        assert!(!store.is_unread(&key));
        assert_eq!(store.unread_count(&key), 0);

        remote.expect("runtime available").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_remote_mark_keeps_local_read() {
        let mut data_port = MockChatDataPort::new();
        data_port
            .expect_mark_chat_read()
            .returning(|_, _| Err(DataSourceError::network("offline")));
        let store = make_store(Arc::new(MockSnapshotStorage::new()), data_port);
        let key = ResourceKey::chat("chat-offline");
        store.set_exact_count(&key, 2);

        store.mark_chat_read("chat-offline").unwrap().await.unwrap();

        assert!(!store.is_unread(&key));
        assert!(store.last_read(&key).is_some());
    }

    #[tokio::test]
    async fn test_channel_marked_read_ignores_older_peek() {
        let mut data_port = MockChatDataPort::new();
        data_port
            .expect_mark_channel_read()
            .returning(|_, _| Ok(()));
        let store = make_store(Arc::new(MockSnapshotStorage::new()), data_port);
        let key = ResourceKey::channel("team-1", "ch-4");

        store.mark_channel_read("team-1", "ch-4").unwrap().await.unwrap();
        store.update_channel_unread("team-1", "ch-4", "2020-01-01T00:00:00Z", Some("other"), ME);

        assert!(!store.is_unread(&key));
        assert!(store.last_read(&key).is_some());
    }

    #[tokio::test]
    async fn test_load_restores_snapshot() {
        let storage = Arc::new(MockSnapshotStorage::with_blob(
            READ_STATE_NAMESPACE,
            json!({
                "version": 1,
                "readTimestamps": {
                    "chat-loaded": { "timestamp": "2026-02-28T10:00:00Z", "source": "local" }
                },
                "lastKnownPreviewIds": {},
                "channelLastMessageTimes": {}
            }),
        ));
        let store = make_store(storage, MockChatDataPort::new());

        store.load().await;

        assert!(store.is_loaded());
        assert_eq!(
            store.last_read(&ResourceKey::chat("chat-loaded")).as_deref(),
            Some("2026-02-28T10:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let store = make_store(storage.clone(), MockChatDataPort::new());
        store.load().await;

        storage
            .set(
                READ_STATE_NAMESPACE,
                json!({
                    "version": 1,
                    "readTimestamps": {
                        "late": { "timestamp": "2026-02-28T10:00:00Z", "source": "local" }
                    }
                }),
            )
            .await
            .unwrap();
        store.load().await;

        assert!(store.last_read(&ResourceKey::chat("late")).is_none());
    }

    #[tokio::test]
    async fn test_load_falls_back_on_bad_data() {
        let failing = Arc::new(MockSnapshotStorage::new());
        failing.fail_reads();
        let store = make_store(failing, MockChatDataPort::new());
        store.load().await;
        assert!(store.is_loaded());
        assert_eq!(store.total_unread(), 0);

        let wrong_version = Arc::new(MockSnapshotStorage::with_blob(
            READ_STATE_NAMESPACE,
            json!({ "version": 2, "readTimestamps": { "x": { "timestamp": "2026", "source": "local" } } }),
        ));
        let store = make_store(wrong_version, MockChatDataPort::new());
        store.load().await;
        assert!(store.last_read(&ResourceKey::chat("x")).is_none());
    }

    #[tokio::test]
    async fn test_load_does_not_regress_fresher_local_mark() {
        let storage = Arc::new(MockSnapshotStorage::with_blob(
            READ_STATE_NAMESPACE,
            json!({
                "version": 1,
                "readTimestamps": {
                    "chat-a": { "timestamp": "2020-01-01T00:00:00Z", "source": "local" }
                }
            }),
        ));
        let store = make_store(storage, MockChatDataPort::new());
        store.touch_read_timestamp(&ResourceKey::chat("chat-a"), None);
        let before = store.last_read(&ResourceKey::chat("chat-a"));

        store.load().await;

        assert_eq!(store.last_read(&ResourceKey::chat("chat-a")), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_persist_coalesces_writes() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let store = make_store(storage.clone(), MockChatDataPort::new());

        store.touch_read_timestamp(&ResourceKey::chat("a"), None);
        store.touch_read_timestamp(&ResourceKey::chat("b"), None);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        store.touch_read_timestamp(&ResourceKey::chat("c"), None);
        assert_eq!(storage.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(storage.write_count(), 1);

        let blob = storage.blob(READ_STATE_NAMESPACE).await.unwrap();
        assert_eq!(blob["readTimestamps"].as_object().unwrap().len(), 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_now_and_cancels_timer() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let store = make_store(storage.clone(), MockChatDataPort::new());

        store.touch_read_timestamp(&ResourceKey::chat("chat-persist"), None);
        store.flush().await;
        assert_eq!(storage.write_count(), 1);

        let blob = storage.blob(READ_STATE_NAMESPACE).await.unwrap();
        assert_eq!(blob["version"], 1);
        assert_eq!(blob["readTimestamps"]["chat-persist"]["source"], "local");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_cursor_is_persisted_after_poll() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let store = make_store(storage.clone(), MockChatDataPort::new());

        store.update_from_chats(&[chat("c1", "m1", "2026-02-28T12:00:00Z", "other")], ME);
        tokio::time::sleep(DEFAULT_PERSIST_DELAY + Duration::from_millis(10)).await;

        let blob = storage.blob(READ_STATE_NAMESPACE).await.unwrap();
        assert_eq!(blob["lastKnownPreviewIds"]["c1"], "m1");
    }

    #[tokio::test]
    async fn test_overlapping_persists_land_in_order() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let store = make_store(storage.clone(), MockChatDataPort::new());
        storage.hold_next_write();

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.persist().await }
        });
        storage.wait_for_held_write().await;

        store.touch_read_timestamp(&ResourceKey::chat("later"), None);
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.flush().await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        storage.release_held_write();
        first.await.unwrap();
        second.await.unwrap();

        let blob = storage.blob(READ_STATE_NAMESPACE).await.unwrap();
        assert!(blob["readTimestamps"]["later"].is_object());
        assert_eq!(storage.write_count(), 2);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let storage = Arc::new(MockSnapshotStorage::new());
        storage.fail_writes();
        let store = make_store(storage.clone(), MockChatDataPort::new());

        store.touch_read_timestamp(&ResourceKey::chat("a"), None);
        store.flush().await;

        assert_eq!(storage.write_count(), 0);
        assert!(!store.is_unread(&ResourceKey::chat("a")));
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let first = make_store(storage.clone(), MockChatDataPort::new());
        first.touch_read_timestamp(&ResourceKey::channel("t1", "c1"), Some("2099-01-01T00:00:00Z"));
        first.flush().await;

        let second = make_store(storage, MockChatDataPort::new());
        second.load().await;

        assert_eq!(
            second.last_read(&ResourceKey::channel("t1", "c1")).as_deref(),
            Some("2099-01-01T00:00:00Z")
        );
        assert_eq!(
            second.snapshot_last_read("t1:c1", Some("2026-01-01T00:00:00Z")).as_deref(),
            Some("2099-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_total_subscription_tracks_changes() {
        let store = make_store(Arc::new(MockSnapshotStorage::new()), MockChatDataPort::new());
        let mut total = store.subscribe_total();

        store.update_from_chats(
            &[
                chat("c1", "m1", "2026-02-28T12:00:00Z", "other"),
                chat("c2", "m2", "2026-02-28T12:00:00Z", "other"),
            ],
            ME,
        );
        assert!(total.has_changed().unwrap());
        assert_eq!(*total.borrow_and_update(), 2);

        store.set_exact_count(&ResourceKey::chat("c1"), 5);
        assert!(!total.has_changed().unwrap());

        store.touch_read_timestamp(&ResourceKey::chat("c2"), None);
        assert_eq!(*total.borrow_and_update(), 1);
        assert_eq!(store.unread_entries(), vec![("c1".to_string(), 5)]);
    }

    #[tokio::test]
    async fn test_section_unread_item_count() {
        let store = make_store(Arc::new(MockSnapshotStorage::new()), MockChatDataPort::new());
        store.set_exact_count(&ResourceKey::chat("chat-a"), 3);
        store.set_exact_count(&ResourceKey::channel("team-1", "ch-b"), 1);
        store.set_exact_count(&ResourceKey::chat("chat-c"), 0);

        let items = [
            SectionItem::chat("chat-a"),
            SectionItem::channel("team-1", "ch-b"),
            SectionItem::chat("chat-c"),
        ];

        assert_eq!(store.section_unread_item_count(&items), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let store = make_store(Arc::new(MockSnapshotStorage::new()), MockChatDataPort::new());
        store.load().await;
        store.touch_read_timestamp(&ResourceKey::chat("a"), None);
        store.set_exact_count(&ResourceKey::chat("b"), 1);

        store.reset();

        assert!(!store.is_loaded());
        assert_eq!(store.total_unread(), 0);
        assert!(store.last_read(&ResourceKey::chat("a")).is_none());
    }

    #[test]
    fn test_mutations_work_without_runtime() {
        let store = make_store(Arc::new(MockSnapshotStorage::new()), MockChatDataPort::new());

        store.touch_read_timestamp(&ResourceKey::chat("a"), None);

        assert!(store.mark_chat_read("a").is_none());
        assert!(store.last_read(&ResourceKey::chat("a")).is_some());
        assert!(matches!(
            store.snapshot_last_read("a", None),
            Some(ts) if ts.ends_with('Z')
        ));
    }
}
