//! Application services.

mod sections;
mod unread_badge;
mod unread_poller;
mod unread_store;

pub use sections::{SECTIONS_NAMESPACE, SectionsService};
pub use unread_badge::UnreadBadge;
pub use unread_poller::{MIN_POLL_INTERVAL, PollerConfig, UnreadPoller};
pub use unread_store::{DEFAULT_PERSIST_DELAY, READ_STATE_NAMESPACE, UnreadStore};
