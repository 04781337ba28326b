//! Pure domain services.

mod section_layout;
mod unread_ledger;

pub use section_layout::SectionLayout;
pub use unread_ledger::UnreadLedger;
