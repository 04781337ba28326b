//! Domain entity definitions.

mod chat;
mod read_state;
mod resource_key;
mod section;
mod snapshot;
mod token;

pub use chat::{ChannelPeek, ChatSummary, MessagePreview, WatchedChannel};
pub use read_state::{ReadSource, ReadTimestamp, iso_now, iso_timestamp};
pub use resource_key::{ResourceKey, ResourceKind};
pub use section::{
    FAVORITES_SECTION_ID, OTHER_SECTION_ID, OTHER_SECTION_ORDER, Section, SectionItem,
    SectionsData,
};
pub use snapshot::{SNAPSHOT_VERSION, UnreadSnapshot};
pub use token::AccessToken;
