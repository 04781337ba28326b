//! Teamy unread - read-state reconciliation for Teams-style chats.
//!
//! This crate tracks which chats and channels have unread activity. It
//! reconciles polled conversation previews with locally recorded read marks,
//! persists the result across restarts, and groups resources into user-defined
//! sidebar sections.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services, use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, rules and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "teamy-unread";
