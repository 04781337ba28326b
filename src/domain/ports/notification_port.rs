/// Port for system notifications.
pub trait NotificationPort: Send + Sync {
    /// Shows a system notification.
    fn send(&self, title: &str, body: &str);
}
