//! Sidebar section entities.

use serde::{Deserialize, Serialize};

use super::{ResourceKey, ResourceKind};

/// Id of the built-in "Favorites" section.
pub const FAVORITES_SECTION_ID: &str = "favorites";
/// Id of the built-in catch-all section.
pub const OTHER_SECTION_ID: &str = "other";
/// Sort key that pins the catch-all section last.
pub const OTHER_SECTION_ORDER: i64 = 999;

/// Reference to a chat or channel placed in a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionItem {
    /// Resource kind.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Chat or channel id.
    pub id: String,
    /// Owning team, for channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl SectionItem {
    /// Creates a chat reference.
    #[must_use]
    pub fn chat(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Chat,
            id: id.into(),
            team_id: None,
        }
    }

    /// Creates a channel reference.
    #[must_use]
    pub fn channel(team_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Channel,
            id: id.into(),
            team_id: Some(team_id.into()),
        }
    }

    /// Resolves the resource key this item points at.
    #[must_use]
    pub fn resource_key(&self) -> ResourceKey {
        match self.kind {
            ResourceKind::Chat => ResourceKey::chat(&self.id),
            ResourceKind::Channel => {
                ResourceKey::channel(self.team_id.clone().unwrap_or_default(), &self.id)
            }
        }
    }

    /// Returns the flat key shared with unread tracking.
    #[must_use]
    pub fn key(&self) -> String {
        self.resource_key().storage_key()
    }
}

/// A named group of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Sort key, ascending.
    pub order: i64,
    /// Built-in sections cannot be renamed or deleted.
    pub is_default: bool,
    /// Items explicitly placed here.
    #[serde(default)]
    pub items: Vec<SectionItem>,
}

impl Section {
    /// Creates an empty section.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            order,
            is_default: false,
            items: Vec::new(),
        }
    }

    /// The built-in "Favorites" section.
    #[must_use]
    pub fn favorites() -> Self {
        Self {
            is_default: true,
            ..Self::new(FAVORITES_SECTION_ID, "Favorites", 0)
        }
    }

    /// The built-in catch-all section.
    #[must_use]
    pub fn other() -> Self {
        Self {
            is_default: true,
            ..Self::new(OTHER_SECTION_ID, "Other", OTHER_SECTION_ORDER)
        }
    }

    /// Returns true for the catch-all section.
    #[must_use]
    pub fn is_other(&self) -> bool {
        self.id == OTHER_SECTION_ID
    }
}

/// Persisted form of the section overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsData {
    /// All sections, default ones included.
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Keys of items hidden from default views.
    #[serde(default)]
    pub hidden_item_keys: Vec<String>,
}
