//! Persisted sidebar sections.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::entities::{Section, SectionItem, SectionsData, WatchedChannel};
use crate::domain::ports::SnapshotStoragePort;
use crate::domain::services::SectionLayout;

/// Storage namespace of the section overlay.
pub const SECTIONS_NAMESPACE: &str = "sections";

/// Shared section overlay. Every mutation persists right away.
#[derive(Clone)]
pub struct SectionsService {
    inner: Arc<SectionsInner>,
}

struct SectionsInner {
    layout: Mutex<SectionLayout>,
    loaded: AtomicBool,
    storage: Arc<dyn SnapshotStoragePort>,
    persist_lock: tokio::sync::Mutex<()>,
    watched_tx: watch::Sender<Vec<WatchedChannel>>,
    chats_tx: watch::Sender<Vec<String>>,
}

impl SectionsService {
    #[must_use]
    pub fn new(storage: Arc<dyn SnapshotStoragePort>) -> Self {
        let (watched_tx, _) = watch::channel(Vec::new());
        let (chats_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(SectionsInner {
                layout: Mutex::new(SectionLayout::new()),
                loaded: AtomicBool::new(false),
                storage,
                persist_lock: tokio::sync::Mutex::new(()),
                watched_tx,
                chats_tx,
            }),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::SeqCst)
    }

    /// Loads persisted sections once. Missing or unreadable data yields the
    /// built-in sections.
    pub async fn load(&self) {
        if self.is_loaded() {
            return;
        }

        let data = match self.inner.storage.get(SECTIONS_NAMESPACE).await {
            Ok(Some(blob)) => match serde_json::from_value::<SectionsData>(blob) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed sections data");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load sections, using defaults");
                None
            }
        };

        let layout = data.map_or_else(SectionLayout::new, SectionLayout::from_data);
        info!(sections = layout.sections().len(), "Sections loaded");
        self.update(|current| *current = layout);
        self.inner.loaded.store(true, Ordering::SeqCst);
    }

    /// Sections in ascending order.
    #[must_use]
    pub fn sorted_sections(&self) -> Vec<Section> {
        self.inner.layout.lock().sorted().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn section(&self, id: &str) -> Option<Section> {
        self.inner.layout.lock().section(id).cloned()
    }

    #[must_use]
    pub fn is_hidden(&self, item: &SectionItem) -> bool {
        self.inner.layout.lock().is_hidden(item)
    }

    /// Keys of items placed in any section other than "Other".
    #[must_use]
    pub fn assigned_item_keys(&self) -> HashSet<String> {
        self.inner.layout.lock().assigned_item_keys()
    }

    /// Channels the poller should watch.
    #[must_use]
    pub fn watched_channels(&self) -> Vec<WatchedChannel> {
        self.inner.layout.lock().watched_channels()
    }

    /// Subscribes to changes of the watched channel set.
    #[must_use]
    pub fn subscribe_watched_channels(&self) -> watch::Receiver<Vec<WatchedChannel>> {
        self.inner.watched_tx.subscribe()
    }

    /// Chats kept in sections, polled even when they fall off the recent page.
    #[must_use]
    pub fn section_chat_ids(&self) -> Vec<String> {
        self.inner.layout.lock().section_chat_ids()
    }

    /// Subscribes to changes of [`section_chat_ids`](Self::section_chat_ids).
    #[must_use]
    pub fn subscribe_section_chats(&self) -> watch::Receiver<Vec<String>> {
        self.inner.chats_tx.subscribe()
    }

    /// Creates a custom section and returns its id.
    pub async fn create_section(&self, label: &str) -> String {
        let id = self.update(|layout| layout.create_section(label));
        debug!(section_id = %id, "Section created");
        self.persist().await;
        id
    }

    pub async fn rename_section(&self, id: &str, label: &str) -> bool {
        let renamed = self.update(|layout| layout.rename_section(id, label));
        if renamed {
            self.persist().await;
        }
        renamed
    }

    pub async fn delete_section(&self, id: &str) -> bool {
        let deleted = self.update(|layout| layout.delete_section(id));
        if deleted {
            debug!(section_id = %id, "Section deleted");
            self.persist().await;
        }
        deleted
    }

    pub async fn move_item(&self, item: SectionItem, target_section_id: &str) -> bool {
        let moved = self.update(|layout| layout.move_item(item, target_section_id));
        if moved {
            self.persist().await;
        } else {
            warn!(section_id = %target_section_id, "Move target does not exist");
        }
        moved
    }

    pub async fn hide_item(&self, item: &SectionItem) {
        self.update(|layout| layout.hide_item(item));
        self.persist().await;
    }

    pub async fn unhide_item(&self, item: &SectionItem) -> bool {
        let unhidden = self.update(|layout| layout.unhide_item(item));
        if unhidden {
            self.persist().await;
        }
        unhidden
    }

    /// Writes the current layout. Failures are logged.
    pub async fn persist(&self) {
        let _write = self.inner.persist_lock.lock().await;
        let data = self.inner.layout.lock().to_data();
        let blob = match serde_json::to_value(&data) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to encode sections");
                return;
            }
        };

        if let Err(e) = self.inner.storage.set(SECTIONS_NAMESPACE, blob).await {
            warn!(error = %e, "Failed to persist sections");
        }
    }

    /// Restores the built-in sections and forgets that data was loaded.
    pub fn reset(&self) {
        self.update(|layout| *layout = SectionLayout::new());
        self.inner.loaded.store(false, Ordering::SeqCst);
    }

    fn update<R>(&self, apply: impl FnOnce(&mut SectionLayout) -> R) -> R {
        let (result, watched, chats) = {
            let mut layout = self.inner.layout.lock();
            let result = apply(&mut layout);
            (result, layout.watched_channels(), layout.section_chat_ids())
        };

        publish_if_changed(&self.inner.watched_tx, watched);
        publish_if_changed(&self.inner.chats_tx, chats);
        result
    }
}

fn publish_if_changed<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{FAVORITES_SECTION_ID, OTHER_SECTION_ID};
    use crate::domain::ports::mocks::MockSnapshotStorage;
    use serde_json::json;

    fn make_service() -> (SectionsService, Arc<MockSnapshotStorage>) {
        let storage = Arc::new(MockSnapshotStorage::new());
        (SectionsService::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_fresh_service_has_defaults() {
        let (service, _) = make_service();
        service.load().await;

        let ids: Vec<_> = service.sorted_sections().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![FAVORITES_SECTION_ID, OTHER_SECTION_ID]);
    }

    #[tokio::test]
    async fn test_mutations_persist_immediately() {
        let (service, storage) = make_service();

        let id = service.create_section("Work").await;
        service.move_item(SectionItem::chat("c1"), &id).await;

        assert_eq!(storage.write_count(), 2);
        let blob = storage.blob(SECTIONS_NAMESPACE).await.unwrap();
        assert_eq!(blob["sections"].as_array().unwrap().len(), 3);
        assert!(blob["hiddenItemKeys"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_mutations_do_not_persist() {
        let (service, storage) = make_service();

        assert!(!service.rename_section(FAVORITES_SECTION_ID, "Stars").await);
        assert!(!service.delete_section(OTHER_SECTION_ID).await);
        assert!(!service.move_item(SectionItem::chat("c1"), "missing").await);
        assert!(!service.unhide_item(&SectionItem::chat("c1")).await);

        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_round_trip_through_storage() {
        let storage = Arc::new(MockSnapshotStorage::new());
        let first = SectionsService::new(storage.clone());
        let id = first.create_section("Projects").await;
        first.move_item(SectionItem::channel("t1", "ch1"), &id).await;
        first.hide_item(&SectionItem::chat("noise")).await;

        let second = SectionsService::new(storage);
        second.load().await;

        assert_eq!(second.section(&id).unwrap().label, "Projects");
        assert!(second.is_hidden(&SectionItem::chat("noise")));
        assert_eq!(second.watched_channels(), vec![WatchedChannel::new("t1", "ch1")]);
    }

    #[tokio::test]
    async fn test_load_falls_back_on_malformed_data() {
        let storage = Arc::new(MockSnapshotStorage::with_blob(
            SECTIONS_NAMESPACE,
            json!({ "sections": "not-a-list" }),
        ));
        let service = SectionsService::new(storage);

        service.load().await;

        assert!(service.is_loaded());
        assert_eq!(service.sorted_sections().len(), 2);
    }

    #[tokio::test]
    async fn test_load_falls_back_on_read_failure() {
        let storage = Arc::new(MockSnapshotStorage::new());
        storage.fail_reads();
        let service = SectionsService::new(storage);

        service.load().await;

        assert_eq!(service.sorted_sections().len(), 2);
    }

    #[tokio::test]
    async fn test_watched_channel_subscription() {
        let (service, _) = make_service();
        let mut watched = service.subscribe_watched_channels();

        service.move_item(SectionItem::chat("c1"), FAVORITES_SECTION_ID).await;
        assert!(!watched.has_changed().unwrap());

        service
            .move_item(SectionItem::channel("t1", "ch1"), FAVORITES_SECTION_ID)
            .await;
        assert!(watched.has_changed().unwrap());
        assert_eq!(
            *watched.borrow_and_update(),
            vec![WatchedChannel::new("t1", "ch1")]
        );

        service.hide_item(&SectionItem::channel("t1", "ch1")).await;
        assert!(watched.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_section_chat_subscription() {
        let (service, _) = make_service();
        let mut chats = service.subscribe_section_chats();

        service
            .move_item(SectionItem::channel("t1", "ch1"), FAVORITES_SECTION_ID)
            .await;
        assert!(!chats.has_changed().unwrap());

        service.move_item(SectionItem::chat("c1"), FAVORITES_SECTION_ID).await;
        assert!(chats.has_changed().unwrap());
        assert_eq!(*chats.borrow_and_update(), vec!["c1".to_string()]);
        assert_eq!(service.section_chat_ids(), vec!["c1".to_string()]);

        service.move_item(SectionItem::chat("c1"), OTHER_SECTION_ID).await;
        assert!(chats.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_mutations_persist_latest_layout() {
        let (service, storage) = make_service();
        storage.hold_next_write();

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.create_section("Alpha").await }
        });
        storage.wait_for_held_write().await;

        let second = tokio::spawn({
            let service = service.clone();
            async move { service.create_section("Beta").await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        storage.release_held_write();
        first.await.unwrap();
        second.await.unwrap();

        let blob = storage.blob(SECTIONS_NAMESPACE).await.unwrap();
        assert_eq!(blob["sections"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let (service, storage) = make_service();
        storage.fail_writes();

        let id = service.create_section("Temp").await;

        assert!(service.section(&id).is_some());
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let (service, _) = make_service();
        service.load().await;
        service.create_section("Temp").await;

        service.reset();

        assert!(!service.is_loaded());
        assert_eq!(service.sorted_sections().len(), 2);
    }
}
