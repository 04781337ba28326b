//! Global unread badge.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::ports::NotificationPort;

const APP_NAME: &str = "Teamy";

/// Tracks the global unread total and raises notifications when it grows.
pub struct UnreadBadge {
    notifier: Option<Arc<dyn NotificationPort>>,
    last_total: usize,
}

impl UnreadBadge {
    #[must_use]
    pub fn new(notifier: Option<Arc<dyn NotificationPort>>) -> Self {
        Self {
            notifier,
            last_total: 0,
        }
    }

    /// Tray tooltip for `total`.
    #[must_use]
    pub fn tooltip(total: usize) -> String {
        if total == 0 {
            APP_NAME.to_string()
        } else {
            format!("{APP_NAME} - {total} unread")
        }
    }

    #[must_use]
    pub const fn last_total(&self) -> usize {
        self.last_total
    }

    /// Records a new total and returns the tooltip to show.
    pub fn observe(&mut self, total: usize) -> String {
        if total > self.last_total
            && let Some(notifier) = &self.notifier
        {
            let body = if total == 1 {
                "1 conversation has unread messages".to_string()
            } else {
                format!("{total} conversations have unread messages")
            };
            notifier.send(APP_NAME, &body);
        }
        self.last_total = total;
        Self::tooltip(total)
    }

    /// Follows `totals` until the sender is dropped.
    pub fn spawn_watcher(mut self, mut totals: watch::Receiver<usize>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = *totals.borrow_and_update();
            self.last_total = initial;
            debug!(total = initial, "Badge watcher started");

            while totals.changed().await.is_ok() {
                let total = *totals.borrow_and_update();
                let tooltip = self.observe(total);
                info!(total, tooltip = %tooltip, "Unread total changed");
            }

            debug!("Badge watcher stopped");
        })
    }
}
