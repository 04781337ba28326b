//! System notifications with conditional compilation.

use crate::domain::ports::NotificationPort;

/// Desktop notification service.
#[cfg(feature = "notify")]
mod notify_impl {
    use super::*;
    use notify_rust::Notification;

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotificationService {
        enabled: bool,
    }

    impl DesktopNotificationService {
        #[must_use]
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        #[must_use]
        pub const fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    impl NotificationPort for DesktopNotificationService {
        fn send(&self, title: &str, body: &str) {
            if !self.enabled {
                return;
            }

            let title = title.to_string();
            let body = body.to_string();

            let show = move || {
                if let Err(e) = Notification::new()
                    .summary(&title)
                    .body(&body)
                    .appname("Teamy")
                    .show()
                {
                    tracing::warn!(error = %e, "Failed to show notification");
                }
            };

            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(show);
                }
                Err(_) => show(),
            }
        }
    }
}

/// Stub notification service when notify feature is disabled.
#[cfg(not(feature = "notify"))]
mod stub_impl {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotificationService;

    impl DesktopNotificationService {
        #[must_use]
        pub fn new(_enabled: bool) -> Self {
            Self
        }

        #[must_use]
        pub const fn is_enabled(&self) -> bool {
            false
        }
    }

    impl NotificationPort for DesktopNotificationService {
        fn send(&self, title: &str, body: &str) {
            tracing::debug!(title, body, "Desktop notifications unavailable");
        }
    }
}

#[cfg(feature = "notify")]
pub use notify_impl::DesktopNotificationService;
#[cfg(not(feature = "notify"))]
pub use stub_impl::DesktopNotificationService;

/// Notification sink that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationService;

impl NotificationPort for LogNotificationService {
    fn send(&self, title: &str, body: &str) {
        tracing::info!(title, body, "Notification");
    }
}
