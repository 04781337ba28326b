//! Periodic conversation and channel polling.
//!
//! Two independent loops feed the [`UnreadStore`]: a conversation loop that
//! refetches the chat list and a channel loop that peeks at the newest message
//! of each watched channel. Each start creates a fresh running flag, so a
//! restart never leaves two generations polling at once.

use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use crate::application::services::UnreadStore;
use crate::domain::entities::WatchedChannel;
use crate::domain::errors::DataSourceError;
use crate::domain::ports::ChatDataPort;

/// Shortest period a poll loop runs at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll cadences and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub chat_interval: Duration,
    pub channel_interval: Duration,
    pub channel_stagger: Duration,
    pub max_watched_channels: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            chat_interval: Duration::from_secs(15),
            channel_interval: Duration::from_secs(20),
            channel_stagger: Duration::from_millis(500),
            max_watched_channels: 15,
        }
    }
}

/// Drives the conversation and channel poll cycles.
pub struct UnreadPoller {
    store: UnreadStore,
    data_port: Arc<dyn ChatDataPort>,
    config: PollerConfig,
    watched: Arc<Mutex<Vec<WatchedChannel>>>,
    section_chats: Arc<Mutex<Vec<String>>>,
    running: Mutex<Option<Arc<AtomicBool>>>,
}

impl UnreadPoller {
    #[must_use]
    pub fn new(store: UnreadStore, data_port: Arc<dyn ChatDataPort>, config: PollerConfig) -> Self {
        Self {
            store,
            data_port,
            config,
            watched: Arc::new(Mutex::new(Vec::new())),
            section_chats: Arc::new(Mutex::new(Vec::new())),
            running: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Returns whether poll loops are active.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Replaces the watched channel set. Takes effect on the next channel tick.
    pub fn set_watched_channels(&self, channels: Vec<WatchedChannel>) {
        debug!(count = channels.len(), "Watched channels updated");
        *self.watched.lock() = channels;
    }

    /// Returns the current watched channel set.
    #[must_use]
    pub fn watched_channels(&self) -> Vec<WatchedChannel> {
        self.watched.lock().clone()
    }

    /// Replaces the chats kept in sections. Those missing from the recent
    /// conversation page are fetched one by one on each conversation poll.
    pub fn set_section_chats(&self, chat_ids: Vec<String>) {
        debug!(count = chat_ids.len(), "Section chats updated");
        *self.section_chats.lock() = chat_ids;
    }

    /// Returns the chats kept in sections.
    #[must_use]
    pub fn section_chats(&self) -> Vec<String> {
        self.section_chats.lock().clone()
    }

    /// Starts both poll loops, stopping any previous ones first.
    ///
    /// The first poll of each loop fires one full interval after this call.
    /// Intervals shorter than [`MIN_POLL_INTERVAL`] are raised to it. Must be
    /// called from within a tokio runtime.
    pub fn start_polling(&self) {
        self.stop_polling();

        let running = Arc::new(AtomicBool::new(true));
        *self.running.lock() = Some(Arc::clone(&running));

        let store = self.store.clone();
        let data_port = Arc::clone(&self.data_port);
        let section_chats = Arc::clone(&self.section_chats);
        spawn_loop(
            "conversation",
            self.config.chat_interval,
            Arc::clone(&running),
            move || {
                let store = store.clone();
                let data_port = Arc::clone(&data_port);
                let chat_ids = section_chats.lock().clone();
                async move { poll_chats_once(&store, data_port.as_ref(), &chat_ids).await }
            },
        );

        let store = self.store.clone();
        let data_port = Arc::clone(&self.data_port);
        let watched = Arc::clone(&self.watched);
        let config = self.config;
        let channel_running = Arc::clone(&running);
        spawn_loop("channel", self.config.channel_interval, running, move || {
            let store = store.clone();
            let data_port = Arc::clone(&data_port);
            let channels = watched.lock().clone();
            let running = Arc::clone(&channel_running);
            async move {
                poll_channels_once(&store, data_port.as_ref(), &channels, &config, &running).await;
            }
        });

        info!(
            chat_interval_ms = self.config.chat_interval.as_millis(),
            channel_interval_ms = self.config.channel_interval.as_millis(),
            "Unread polling started"
        );
    }

    /// Stops both loops. A request already sent is allowed to finish and its
    /// result is still applied.
    pub fn stop_polling(&self) {
        if let Some(running) = self.running.lock().take()
            && running.swap(false, Ordering::SeqCst)
        {
            info!("Unread polling stopped");
        }
    }

    /// Runs one conversation poll immediately.
    pub async fn poll_chats(&self) {
        let chat_ids = self.section_chats();
        poll_chats_once(&self.store, self.data_port.as_ref(), &chat_ids).await;
    }

    /// Runs one channel poll immediately over the current watched set.
    pub async fn poll_channels(&self) {
        let channels = self.watched_channels();
        let always = AtomicBool::new(true);
        poll_channels_once(
            &self.store,
            self.data_port.as_ref(),
            &channels,
            &self.config,
            &always,
        )
        .await;
    }
}

impl Drop for UnreadPoller {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

fn spawn_loop<F, Fut>(name: &'static str, period: Duration, running: Arc<AtomicBool>, mut poll: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = if period < MIN_POLL_INTERVAL {
        warn!(
            poll = name,
            requested_ms = period.as_millis(),
            "Poll interval too short, using minimum"
        );
        MIN_POLL_INTERVAL
    } else {
        period
    };

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while running.load(Ordering::SeqCst) {
            ticker.tick().await;

            if !running.load(Ordering::SeqCst) {
                break;
            }

            if let Err(panic_info) = AssertUnwindSafe(poll()).catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!(poll = name, panic = %panic_msg, "Poll panicked");
            }
        }

        debug!(poll = name, "Poll loop stopped");
    });
}

async fn poll_chats_once(
    store: &UnreadStore,
    data_port: &dyn ChatDataPort,
    section_chats: &[String],
) {
    let mut chats = match data_port.fetch_chats().await {
        Ok(chats) => chats,
        Err(e) => {
            log_poll_failure(&e, "Conversation poll failed");
            return;
        }
    };

    let on_page: HashSet<&str> = chats.iter().map(|chat| chat.id.as_str()).collect();
    let missing: Vec<&String> = section_chats
        .iter()
        .filter(|id| !on_page.contains(id.as_str()))
        .collect();

    for chat_id in missing {
        match data_port.fetch_chat(chat_id).await {
            Ok(Some(chat)) => chats.push(chat),
            Ok(None) => {}
            Err(e) => {
                if e.is_recoverable() {
                    warn!(chat_id = %chat_id, error = %e, "Section chat poll failed");
                } else {
                    error!(chat_id = %chat_id, error = %e, "Section chat poll failed");
                }
            }
        }
    }

    store.update_from_chats(&chats, store.current_user_id());
}

fn log_poll_failure(e: &DataSourceError, message: &'static str) {
    if e.is_recoverable() {
        warn!(error = %e, "{message}");
    } else {
        error!(error = %e, "{message}");
    }
}

async fn poll_channels_once(
    store: &UnreadStore,
    data_port: &dyn ChatDataPort,
    channels: &[WatchedChannel],
    config: &PollerConfig,
    running: &AtomicBool,
) {
    let channels = &channels[..channels.len().min(config.max_watched_channels)];

    for (index, channel) in channels.iter().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        match data_port
            .peek_channel_latest_message(&channel.team_id, &channel.channel_id)
            .await
        {
            Ok(Some(peek)) => store.update_channel_unread(
                &channel.team_id,
                &channel.channel_id,
                &peek.created_at,
                peek.from_user_id.as_deref(),
                store.current_user_id(),
            ),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => warn!(
                team_id = %channel.team_id,
                channel_id = %channel.channel_id,
                error = %e,
                "Channel poll failed"
            ),
            Err(e) => error!(
                team_id = %channel.team_id,
                channel_id = %channel.channel_id,
                error = %e,
                "Channel poll failed"
            ),
        }

        if index + 1 < channels.len() {
            tokio::time::sleep(config.channel_stagger).await;
        }
    }
}
