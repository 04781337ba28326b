//! Application layer with services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Unread tracking services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{ResolvedToken, TokenSource};
pub use services::{PollerConfig, SectionsService, UnreadBadge, UnreadPoller, UnreadStore};
pub use use_cases::ResolveTokenUseCase;
